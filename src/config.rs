use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;
use crate::finding::Severity;

/// How aggressively comments are flagged as redundant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Exact and near-exact matches only
    Low,
    #[default]
    Medium,
    /// Adds substring coverage and looser token overlap
    High,
}

impl std::str::FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown sensitivity '{other}', expected low, medium or high")),
        }
    }
}

/// Which comments are eligible for scoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentContext {
    /// Only inline comments; `/** */` documentation is left alone
    #[default]
    Inline,
    /// Documentation comments are scored too
    All,
}

/// Tuned constants of the obviousness scorer.
///
/// The defaults were validated against existing fixtures; changing any of
/// them changes which comments get flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreThresholds {
    /// Comments with more tokens than this are never flagged
    pub max_comment_tokens: usize,
    /// A prefix match may leave fewer than this many trailing characters
    pub prefix_remainder_limit: usize,
    /// Gloss tokens must be longer than this to count towards overlap
    pub min_token_len: usize,
    pub overlap_ratio: f64,
    pub min_overlap_tokens: usize,
    /// Overlap ratio accepted at high sensitivity
    pub loose_overlap_ratio: f64,
    /// Share of the comment a substring gloss must cover at high sensitivity
    pub substring_coverage: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            max_comment_tokens: 8,
            prefix_remainder_limit: 5,
            min_token_len: 2,
            overlap_ratio: 0.8,
            min_overlap_tokens: 2,
            loose_overlap_ratio: 0.6,
            substring_coverage: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleOptions {
    pub sensitivity: Sensitivity,
    pub check_leading: bool,
    pub check_trailing: bool,
    /// Regexes matched against the comment text; `/body/flags` is accepted
    pub ignore_patterns: Vec<String>,
    pub comment_context: CommentContext,
    pub severity: Severity,
    pub thresholds: ScoreThresholds,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            check_leading: true,
            check_trailing: true,
            ignore_patterns: Vec::new(),
            comment_context: CommentContext::default(),
            severity: Severity::Warning,
            thresholds: ScoreThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheOptions {
    pub pattern_capacity: usize,
    pub text_capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            pattern_capacity: 100,
            text_capacity: 1000,
        }
    }
}

/// File extensions analyzed when walking a directory
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

/// Top-level config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rule: RuleOptions,
    pub cache: CacheOptions,
    /// Extensions, without the dot, picked up by directory walks
    pub include: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule: RuleOptions::default(),
            cache: CacheOptions::default(),
            include: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| Error::Config {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Split a skip pattern written as `/body/flags` into its parts.
///
/// Anything else is taken as a bare pattern without flags.
pub fn split_pattern(raw: &str) -> (&str, &str) {
    if let Some(rest) = raw.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let flags = &rest[end + 1..];
            if flags.chars().all(|c| c.is_ascii_alphabetic()) {
                return (&rest[..end], flags);
            }
        }
    }
    (raw, "")
}
