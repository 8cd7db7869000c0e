use swc_common::comments::{Comment, CommentKind as SwcCommentKind, SingleThreadedComments};

use crate::parser::{CommentKind, LineIndex, SourceComment};

/// Extract every comment of a file, sorted by position.
///
/// swc files comments as leading or trailing relative to AST nodes; both maps
/// are merged here and the leading/trailing distinction is recomputed from
/// the source line instead.
pub fn collect(
    comments: &SingleThreadedComments,
    source: &str,
    lines: &LineIndex,
    base: u32,
) -> Vec<SourceComment> {
    let (leading, trailing) = comments.borrow_all();
    let mut raw: Vec<&Comment> = leading
        .values()
        .chain(trailing.values())
        .flatten()
        .collect();
    raw.sort_by_key(|cmt| cmt.span.lo);
    raw.dedup_by_key(|cmt| cmt.span.lo);

    let ranges: Vec<(usize, usize)> = raw
        .iter()
        .map(|cmt| {
            (
                cmt.span.lo.0.saturating_sub(base) as usize,
                cmt.span.hi.0.saturating_sub(base) as usize,
            )
        })
        .collect();

    raw.iter()
        .zip(&ranges)
        .enumerate()
        .map(|(i, (cmt, &(lo, hi)))| {
            let span = lines.span(source, lo, hi);
            let line_start = lines.line_start(span.start.line);
            SourceComment {
                kind: match cmt.kind {
                    SwcCommentKind::Line => CommentKind::Line,
                    SwcCommentKind::Block => CommentKind::Block,
                },
                text: cmt.text.to_string(),
                span,
                has_code_before: has_code_before(source, line_start, lo, &ranges[..i]),
            }
        })
        .collect()
}

/// Whether non-comment text sits between `line_start` and `start`.
///
/// `earlier` holds the byte ranges of preceding comments, sorted; those that
/// overlap the line are skipped over rather than counted as code.
pub fn has_code_before(source: &str, line_start: usize, start: usize, earlier: &[(usize, usize)]) -> bool {
    let is_code = |from: usize, to: usize| {
        source
            .get(from..to)
            .is_some_and(|text| !text.trim().is_empty())
    };

    let mut cursor = line_start;
    for &(lo, hi) in earlier.iter().filter(|(_, hi)| *hi > line_start && *hi <= start) {
        if lo > cursor && is_code(cursor, lo) {
            return true;
        }
        cursor = cursor.max(hi);
    }
    cursor < start && is_code(cursor, start)
}
