use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::DEFAULT_EXTENSIONS;
use crate::error::{Error, Result};
use crate::finding::Finding;
use crate::parser::parse_file;
use crate::rule::RedundantCommentRule;

const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", ".git", "target"];

/// Outcome of analyzing one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.error.is_none()
    }
}

pub fn find_all_source_files(root: &str) -> Vec<String> {
    find_source_files(root, DEFAULT_EXTENSIONS)
}

/// Source files under `root` whose extension is one of `extensions`, sorted
pub fn find_source_files<S: AsRef<str>>(root: &str, extensions: &[S]) -> Vec<String> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        // relative to the walk root, so a root inside e.g. `build/` still works
        let relative = p.strip_prefix(root).unwrap_or(p);
        if relative.components().any(|c| SKIPPED_DIRS.iter().any(|dir| c.as_os_str() == *dir)) {
            continue;
        }
        if has_extension(p, extensions) {
            out.push(p.to_string_lossy().to_string());
        }
    }
    out.sort();
    out
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.as_ref() == ext))
}

/// Expand command-line inputs: directories are walked, files kept as given
pub fn collect_inputs<S: AsRef<str>>(inputs: &[String], extensions: &[S]) -> Vec<String> {
    let mut out = Vec::new();
    for input in inputs {
        if Path::new(input).is_dir() {
            out.extend(find_source_files(input, extensions));
        } else {
            out.push(input.clone());
        }
    }
    out
}

/// Parse `source` as `filename` and run the rule over it
pub fn lint_source(source: &str, filename: &str, rule: &RedundantCommentRule) -> Result<Vec<Finding>> {
    let file = parse_file(source, filename)?;
    Ok(rule.check(&file))
}

fn lint_file(path: &str, rule: &RedundantCommentRule) -> Result<Vec<Finding>> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_string(),
        source,
    })?;
    lint_source(&source, path, rule)
}

/// Analyze `paths` in parallel; reports come back in input order
pub fn lint_files(paths: &[String], rule: &RedundantCommentRule) -> Vec<FileReport> {
    paths
        .par_iter()
        .map(|path| match lint_file(path, rule) {
            Ok(findings) => FileReport {
                path: path.clone(),
                findings,
                error: None,
            },
            Err(err) => {
                tracing::debug!(path = %path, error = %err, "file failed");
                FileReport {
                    path: path.clone(),
                    findings: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        })
        .collect()
}
