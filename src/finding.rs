use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::parser::SourceSpan;

pub const RULE_ID: &str = "no-obvious-comments";
pub const MESSAGE_ID: &str = "obviousComment";

const MESSAGE_TEMPLATE: &str =
    "Comment restates what the code does: \"{{comment}}\". Explain why instead, or remove it.";

/// Longest comment excerpt carried in a finding
pub const EXCERPT_LEN: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl From<SourceSpan> for Location {
    fn from(span: SourceSpan) -> Self {
        Location {
            line: span.start.line,
            column: span.start.column,
            end_line: span.end.line,
            end_column: span.end.column,
        }
    }
}

/// A comment reported as restating its code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message_id: String,
    pub message: String,
    pub location: Location,
    /// Template values, e.g. `comment`
    pub data: BTreeMap<String, String>,
}

impl Finding {
    pub fn obvious_comment(comment_text: &str, span: SourceSpan, severity: Severity) -> Self {
        let excerpt = excerpt(comment_text);
        let message = MESSAGE_TEMPLATE.replace("{{comment}}", &excerpt);
        let mut data = BTreeMap::new();
        data.insert("comment".to_string(), excerpt);

        Self {
            rule_id: RULE_ID.to_string(),
            severity,
            message_id: MESSAGE_ID.to_string(),
            message,
            location: span.into(),
            data,
        }
    }
}

/// Trimmed comment text, cut to [`EXCERPT_LEN`] characters with an ellipsis
pub fn excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= EXCERPT_LEN {
        return text.to_string();
    }
    let mut out: String = text.chars().take(EXCERPT_LEN - 3).collect();
    out.push_str("...");
    out
}
