use obvious_comments::config::{Config, RuleOptions};
use obvious_comments::runner::{collect_inputs, find_all_source_files, lint_files};
use obvious_comments::{RedundantCommentRule, Sensitivity, SharedCaches};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn rule(options: RuleOptions) -> RedundantCommentRule {
    RedundantCommentRule::new(options, Arc::new(SharedCaches::default()))
}

fn write(root: &Path, name: &str, contents: &str) -> String {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_reports_follow_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let paths = vec![
        write(root, "c.js", "let i = 0;\n// increment i\ni++;\n"),
        write(root, "a.ts", "export function total(items: number[]) {\n  // loop over items\n  for (const item of items) {}\n}\n"),
        write(root, "b.js", "// keep the cache warm, the first request is slow otherwise\nwarm();\n"),
    ];

    let reports = lint_files(&paths, &rule(RuleOptions::default()));
    let summary: Vec<(String, usize)> = reports
        .iter()
        .map(|report| (report.path.clone(), report.findings.len()))
        .collect();
    assert_eq!(
        summary,
        vec![(paths[0].clone(), 1), (paths[1].clone(), 1), (paths[2].clone(), 0)]
    );
    assert!(reports.iter().all(|report| report.error.is_none()));
}

#[test]
fn test_failures_stay_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let good = write(root, "good.js", "// call run\nrun();\n");
    let broken = write(root, "broken.js", "function (\n");
    let missing = root.join("missing.js").to_string_lossy().to_string();

    let reports = lint_files(&[broken, good, missing], &rule(RuleOptions::default()));
    assert_eq!(reports.len(), 3);
    assert!(reports[0].error.as_deref().unwrap().contains("failed to parse"));
    assert_eq!(reports[1].findings.len(), 1);
    assert!(reports[1].error.is_none());
    assert!(reports[2].error.as_deref().unwrap().contains("failed to read"));
}

#[test]
fn test_directory_walk_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/app.tsx", "// call render\nrender();\n");
    write(root, "src/util.cts", "// decrement count\ncount--;\n");
    write(root, "dist/app.js", "// call render\nrender();\n");
    write(root, ".git/hooks/pre-commit.js", "");

    let root_str = root.to_string_lossy().to_string();
    let files = find_all_source_files(&root_str);
    assert_eq!(files.len(), 2);

    let config_path = write(
        root,
        "lint.json",
        r#"{ "rule": { "sensitivity": "low", "severity": "error" }, "include": ["tsx"] }"#,
    );
    let config = Config::from_path(&config_path).unwrap();
    assert_eq!(config.rule.sensitivity, Sensitivity::Low);

    let files = collect_inputs(&[root_str], &config.include);
    assert_eq!(files.len(), 1);
    let reports = lint_files(&files, &rule(config.rule));
    assert_eq!(reports[0].findings.len(), 1);
    assert_eq!(reports[0].findings[0].severity.to_string(), "error");
}

#[test]
fn test_shared_caches_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let paths: Vec<String> = (0..8)
        .map(|n| write(root, &format!("f{n}.js"), "// TEMP call run\nrun();\n// call run\nrun();\n"))
        .collect();

    let caches = Arc::new(SharedCaches::default());
    let options = RuleOptions {
        ignore_patterns: vec!["/^temp\\b/i".to_string()],
        ..RuleOptions::default()
    };
    let rule = RedundantCommentRule::new(options, caches.clone());
    let reports = lint_files(&paths, &rule);

    for report in &reports {
        let lines: Vec<usize> = report.findings.iter().map(|f| f.location.line).collect();
        assert_eq!(lines, vec![3]);
    }
    let stats = caches.stats();
    assert_eq!(stats.pattern_entries, 1);
    assert!(stats.hits > 0);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bad.json", r#"{ "rule": { "sensitivity": 3 } }"#);
    let err = Config::from_path(&path).unwrap_err();
    assert!(err.to_string().contains("invalid config"));
}
