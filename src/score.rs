use std::collections::HashSet;

use crate::config::{ScoreThresholds, Sensitivity};
use crate::normalize::{normalize, tokens};

/// Decides whether a comment merely restates one of its construct's glosses
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    thresholds: ScoreThresholds,
}

impl Scorer {
    pub fn new(thresholds: ScoreThresholds) -> Self {
        Self { thresholds }
    }

    /// Score already-normalized text against already-normalized glosses
    pub fn is_obvious_normalized<S: AsRef<str>>(
        &self,
        comment: &str,
        glosses: &[S],
        sensitivity: Sensitivity,
    ) -> bool {
        let comment_tokens: HashSet<&str> = tokens(comment).collect();
        if comment.is_empty() || tokens(comment).count() > self.thresholds.max_comment_tokens {
            return false;
        }

        glosses
            .iter()
            .map(|gloss| -> &str { gloss.as_ref() })
            .filter(|gloss| !gloss.is_empty())
            .any(|gloss| self.matches(comment, &comment_tokens, gloss, sensitivity))
    }

    fn matches(&self, comment: &str, comment_tokens: &HashSet<&str>, gloss: &str, sensitivity: Sensitivity) -> bool {
        let t = &self.thresholds;

        if comment == gloss {
            return true;
        }

        if let Some(rest) = comment.strip_prefix(gloss) {
            if rest.len() < t.prefix_remainder_limit {
                return true;
            }
        }

        if sensitivity == Sensitivity::High
            && comment.contains(gloss)
            && gloss.len() as f64 >= comment.len() as f64 * t.substring_coverage
        {
            return true;
        }

        if sensitivity == Sensitivity::Low {
            return false;
        }

        let qualifying: Vec<&str> = tokens(gloss)
            .filter(|token| token.chars().count() > t.min_token_len)
            .collect();
        if qualifying.is_empty() {
            return false;
        }
        let shared = qualifying
            .iter()
            .filter(|token| comment_tokens.contains(*token))
            .count();
        let ratio = shared as f64 / qualifying.len() as f64;

        (ratio >= t.overlap_ratio && qualifying.len() >= t.min_overlap_tokens)
            || (sensitivity == Sensitivity::High && ratio >= t.loose_overlap_ratio)
    }
}

/// Whether `comment_text` restates any of `glosses`, with default thresholds
pub fn is_obvious<S: AsRef<str>>(comment_text: &str, glosses: &[S], sensitivity: Sensitivity) -> bool {
    let comment = normalize(comment_text);
    let glosses: Vec<String> = glosses.iter().map(|g| normalize(g.as_ref())).collect();
    Scorer::default().is_obvious_normalized(&comment, &glosses, sensitivity)
}
