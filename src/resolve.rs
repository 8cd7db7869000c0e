use crate::index::NodeIndex;
use crate::parser::{ConstructId, ConstructKind, SourceComment, SyntaxTree};

/// Lines past the one right after a comment that are still searched
pub const LOOKAHEAD_LINES: usize = 3;

/// Find the construct `comment` most likely documents
pub fn resolve(comment: &SourceComment, tree: &SyntaxTree, index: &NodeIndex) -> Option<ConstructId> {
    let end_line = comment.span.end.line;

    let next = index.at_line(end_line + 1);
    if let Some(&first) = next.first() {
        let meaningful = next.iter().copied().find(|&id| {
            tree.get(id)
                .is_some_and(|node| node.kind != ConstructKind::Empty)
        });
        return Some(meaningful.unwrap_or(first));
    }

    if comment.has_code_before {
        let same = index.at_line(comment.span.start.line);
        if let Some(&first) = same.first() {
            let after = same.iter().copied().find(|&id| {
                tree.get(id)
                    .and_then(|node| node.span)
                    .is_some_and(|span| span.start.offset >= comment.span.end.offset)
            });
            return Some(after.unwrap_or(first));
        }
    }

    (end_line + 2..=end_line + 1 + LOOKAHEAD_LINES)
        .find_map(|line| index.at_line(line).first().copied())
}
