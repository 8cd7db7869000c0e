use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::cache::{PatternKey, SharedCaches};
use crate::config::{split_pattern, CommentContext, RuleOptions};
use crate::finding::Finding;
use crate::gloss;
use crate::index::{NodeIndex, NodeIndexCache};
use crate::normalize::normalize;
use crate::parser::{CommentKind, ParsedFile, SourceComment};
use crate::resolve::resolve;
use crate::score::Scorer;

/// Prefixes of comments addressed to tools rather than readers
const DIRECTIVE_PREFIXES: &[&str] = &[
    "eslint",
    "global ",
    "globals ",
    "jshint",
    "jslint",
    "istanbul ",
    "c8 ",
    "prettier-ignore",
    "@ts-",
    "tslint:",
    "webpack",
    "#region",
    "#endregion",
    "@flow",
    "@jsx",
    "@license",
    "@preserve",
    "@vite-ignore",
];

/// Phrases that mark a comment as explaining why; any of them exempts it
const WHY_INDICATORS: &[&str] = &[
    "because",
    "since",
    "workaround",
    "hack",
    "performance",
    "perf",
    "deprecated",
    "todo",
    "fixme",
    "xxx",
    "note",
    "bug",
    "issue",
    "ensure",
    "otherwise",
    "avoid",
    "prevent",
    "so that",
    "in order to",
    "required",
    "compat",
    "compatibility",
    "legacy",
    "temporary",
    "security",
    "race",
    "edge case",
    "polyfill",
    "browser",
    "intentionally",
    "see",
    "http",
    "https",
];

static WHY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = WHY_INDICATORS
        .iter()
        .map(|phrase| regex::escape(phrase).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("why-indicator regex is valid")
});

/// Why a comment was left out of scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    Documentation,
    Directive,
    IgnorePattern,
    ExplainsWhy,
    PositionDisabled,
}

pub fn is_directive(comment: &SourceComment) -> bool {
    let text = comment.text.trim_start();
    // triple-slash directives: `/// <reference ... />`
    if comment.kind == CommentKind::Line {
        if let Some(rest) = text.strip_prefix('/') {
            if rest.trim_start().starts_with('<') {
                return true;
            }
        }
    }
    let lower = text.to_ascii_lowercase();
    DIRECTIVE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

pub fn explains_why(text: &str) -> bool {
    WHY_REGEX.is_match(text)
}

/// Comment body with `/** */` gutter stars removed
fn strip_doc_gutter(text: &str) -> String {
    text.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flags comments that restate the code they sit on.
///
/// One instance serves a whole run: the node-index cache is keyed by tree
/// identity and the shared caches are locked internally, so `check` may be
/// called for different files from different threads.
pub struct RedundantCommentRule {
    options: RuleOptions,
    scorer: Scorer,
    /// Parsed `ignorePatterns` keys, compiled lazily through the shared cache
    patterns: Vec<PatternKey>,
    caches: Arc<SharedCaches>,
    indexes: NodeIndexCache,
}

impl RedundantCommentRule {
    pub fn new(options: RuleOptions, caches: Arc<SharedCaches>) -> Self {
        let patterns = options
            .ignore_patterns
            .iter()
            .map(|raw| {
                let (pattern, flags) = split_pattern(raw);
                PatternKey {
                    pattern: pattern.to_string(),
                    flags: flags.to_string(),
                }
            })
            .collect();

        Self {
            scorer: Scorer::new(options.thresholds.clone()),
            options,
            patterns,
            caches,
            indexes: NodeIndexCache::new(),
        }
    }

    /// Reason `comment` is not scored, if any
    pub fn skip_reason(&self, comment: &SourceComment) -> Option<SkipReason> {
        if normalize(&comment.text).is_empty() {
            return Some(SkipReason::Blank);
        }
        if comment.is_doc() && self.options.comment_context == CommentContext::Inline {
            return Some(SkipReason::Documentation);
        }
        if is_directive(comment) {
            return Some(SkipReason::Directive);
        }
        let text = comment.text.trim();
        let ignored = self
            .patterns
            .iter()
            .filter_map(|key| self.caches.pattern(key))
            .any(|regex| regex.is_match(text));
        if ignored {
            return Some(SkipReason::IgnorePattern);
        }
        if explains_why(text) {
            return Some(SkipReason::ExplainsWhy);
        }
        let enabled = if comment.has_code_before {
            self.options.check_trailing
        } else {
            self.options.check_leading
        };
        if !enabled {
            return Some(SkipReason::PositionDisabled);
        }
        None
    }

    /// Report every comment of `file` that restates its construct
    pub fn check(&self, file: &ParsedFile) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut index: Option<Arc<NodeIndex>> = None;

        for comment in &file.comments {
            if let Some(reason) = self.skip_reason(comment) {
                tracing::trace!(path = %file.path, line = comment.span.start.line, ?reason, "comment skipped");
                continue;
            }

            let index = index.get_or_insert_with(|| NodeIndex::for_tree(&self.indexes, &file.tree));
            let Some(construct) = resolve(comment, &file.tree, index).and_then(|id| file.tree.get(id)) else {
                continue;
            };
            let glosses = gloss::generate(construct);
            if glosses.is_empty() {
                continue;
            }

            let text = if comment.is_doc() {
                strip_doc_gutter(&comment.text)
            } else {
                comment.text.clone()
            };
            let normalized = normalize(&text);
            let glosses: Vec<Arc<str>> = glosses.iter().map(|g| self.caches.normalized(g)).collect();

            if self
                .scorer
                .is_obvious_normalized(&normalized, &glosses, self.options.sensitivity)
            {
                findings.push(Finding::obvious_comment(&text, comment.span, self.options.severity));
            }
        }

        tracing::debug!(
            path = %file.path,
            comments = file.comments.len(),
            findings = findings.len(),
            "checked file"
        );
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sensitivity;
    use crate::finding::{MESSAGE_ID, RULE_ID};
    use crate::parser::parse_file;
    use pretty_assertions::assert_eq;

    fn rule(options: RuleOptions) -> RedundantCommentRule {
        RedundantCommentRule::new(options, Arc::new(SharedCaches::default()))
    }

    fn check(source: &str, options: RuleOptions) -> Vec<Finding> {
        let file = parse_file(source, "test.js").unwrap();
        rule(options).check(&file)
    }

    fn flagged_lines(source: &str, options: RuleOptions) -> Vec<usize> {
        check(source, options)
            .into_iter()
            .map(|finding| finding.location.line)
            .collect()
    }

    #[test]
    fn test_increment_comment_is_flagged() {
        let findings = check("let i = 0;\n// increment i\ni++;\n", RuleOptions::default());
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.rule_id, RULE_ID);
        assert_eq!(finding.message_id, MESSAGE_ID);
        assert_eq!(finding.location.line, 2);
        assert_eq!(finding.data["comment"], "increment i");
    }

    #[test]
    fn test_byte_order_mark_keeps_positions() {
        let findings = check("\u{feff}let i = 0;\n// increment i\ni++;\n", RuleOptions::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 2);
        assert_eq!(findings[0].location.column, 0);
        assert_eq!(findings[0].data["comment"], "increment i");
    }

    #[test]
    fn test_why_comment_is_not_flagged() {
        let source = "let i = 0;\n// increment i because the loop requires zero-based adjustment\ni++;\n";
        assert!(check(source, RuleOptions::default()).is_empty());
    }

    #[test]
    fn test_return_comment_is_flagged() {
        let source = "function sum(total) {\n  // returns the total\n  return total;\n}\n";
        assert_eq!(flagged_lines(source, RuleOptions::default()), vec![2]);
    }

    #[test]
    fn test_trailing_comment_at_end_of_file() {
        let source = "doWork();\n\n// call doWork\n";
        assert!(check(source, RuleOptions::default()).is_empty());
    }

    #[test]
    fn test_trailing_comment_on_same_line() {
        let source = "counter++; // increment counter\n";
        assert_eq!(flagged_lines(source, RuleOptions::default()), vec![1]);

        let options = RuleOptions {
            check_trailing: false,
            ..RuleOptions::default()
        };
        assert!(check(source, options).is_empty());
    }

    #[test]
    fn test_leading_toggle() {
        let source = "// increment i\ni++;\n";
        let options = RuleOptions {
            check_leading: false,
            ..RuleOptions::default()
        };
        assert!(check(source, options).is_empty());
    }

    #[test]
    fn test_blank_lines_between_comment_and_code() {
        let source = "// call fetchData\n\n\nfetchData();\n";
        assert_eq!(flagged_lines(source, RuleOptions::default()), vec![1]);
    }

    #[test]
    fn test_rationale_comment_is_kept() {
        let source = "// retry once, the upstream API drops the first request\nfetchData();\n";
        assert!(check(source, RuleOptions::default()).is_empty());
    }

    #[test]
    fn test_documentation_comment_policy() {
        let source = "/**\n * function add\n */\nfunction add(a, b) { return a + b; }\n";
        assert!(check(source, RuleOptions::default()).is_empty());

        let options = RuleOptions {
            comment_context: CommentContext::All,
            ..RuleOptions::default()
        };
        assert_eq!(flagged_lines(source, options), vec![1]);
    }

    #[test]
    fn test_directives_are_skipped() {
        let source = "// eslint-disable-next-line no-console\nconsole.log(x);\n/* global console */\nconsole.log(y);\n";
        assert!(check(source, RuleOptions::default()).is_empty());
    }

    #[test]
    fn test_ignore_patterns() {
        let source = "// KEEP: increment i\ni++;\n";
        let options = RuleOptions {
            ignore_patterns: vec!["/^keep:/i".to_string()],
            sensitivity: Sensitivity::High,
            ..RuleOptions::default()
        };
        assert!(check(source, options).is_empty());
    }

    #[test]
    fn test_invalid_ignore_pattern_fails_open() {
        let source = "// increment i\ni++;\n";
        let options = RuleOptions {
            ignore_patterns: vec!["(unclosed".to_string()],
            ..RuleOptions::default()
        };
        assert_eq!(flagged_lines(source, options), vec![1]);
    }

    #[test]
    fn test_sensitivity_levels() {
        let source = "const items = [];\n// we loop over the items\nfor (const item of items) {}\n";
        let at = |sensitivity| {
            flagged_lines(
                source,
                RuleOptions {
                    sensitivity,
                    ..RuleOptions::default()
                },
            )
        };
        assert!(at(Sensitivity::Low).is_empty());
        assert_eq!(at(Sensitivity::Medium), vec![2]);
        assert_eq!(at(Sensitivity::High), vec![2]);
    }

    #[test]
    fn test_skip_reasons() {
        let rule = rule(RuleOptions::default());
        let comment = |text: &str, kind| SourceComment {
            kind,
            text: text.to_string(),
            span: Default::default(),
            has_code_before: false,
        };
        assert_eq!(rule.skip_reason(&comment("   ", CommentKind::Line)), Some(SkipReason::Blank));
        assert_eq!(rule.skip_reason(&comment(" ------", CommentKind::Line)), Some(SkipReason::Blank));
        assert_eq!(
            rule.skip_reason(&comment("* docs", CommentKind::Block)),
            Some(SkipReason::Documentation)
        );
        assert_eq!(
            rule.skip_reason(&comment("/ <reference types=\"node\" />", CommentKind::Line)),
            Some(SkipReason::Directive)
        );
        assert_eq!(
            rule.skip_reason(&comment(" @ts-expect-error", CommentKind::Line)),
            Some(SkipReason::Directive)
        );
        assert_eq!(
            rule.skip_reason(&comment(" hack for old Safari", CommentKind::Line)),
            Some(SkipReason::ExplainsWhy)
        );
        assert_eq!(rule.skip_reason(&comment(" denote the end", CommentKind::Line)), None);
    }

    #[test]
    fn test_long_comment_text_is_truncated() {
        let source = "// call doWork call doWork call doWork with some padding text\ndoWork();\n";
        let findings = check(
            source,
            RuleOptions {
                sensitivity: Sensitivity::High,
                thresholds: crate::config::ScoreThresholds {
                    max_comment_tokens: 20,
                    ..Default::default()
                },
                ..RuleOptions::default()
            },
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].data["comment"].ends_with("..."));
        assert_eq!(findings[0].data["comment"].chars().count(), 50);
    }
}
