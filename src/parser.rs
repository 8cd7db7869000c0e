use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swc_common::{comments::SingleThreadedComments, sync::Lrc, FileName, Globals, SourceMap, Spanned, GLOBALS};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

use crate::analyzer::{comments, lower};
use crate::error::{Error, Result};

/// A point in a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line
    pub line: usize,
    /// 0-based column, in characters
    pub column: usize,
    /// 0-based byte offset from the start of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: Position,
    pub end: Position,
}

impl SourceSpan {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Byte offset to line/column translation for one source text
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    /// Byte offset where `line` (1-based) begins
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts
            .get(line.saturating_sub(1))
            .copied()
            .unwrap_or_else(|| self.line_starts.last().copied().unwrap_or(0))
    }

    pub fn position(&self, source: &str, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset).max(1);
        let start = self.line_start(line);
        let column = source
            .get(start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset.saturating_sub(start));
        Position::new(line, column, offset)
    }

    pub fn span(&self, source: &str, lo: usize, hi: usize) -> SourceSpan {
        SourceSpan::new(self.position(source, lo), self.position(source, hi))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Line,
    Block,
}

/// A comment as written in the source, delimiters removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceComment {
    pub kind: CommentKind,
    pub text: String,
    pub span: SourceSpan,
    /// A non-comment token precedes the comment on its start line
    pub has_code_before: bool,
}

impl SourceComment {
    /// `/** ... */` documentation block
    pub fn is_doc(&self) -> bool {
        self.kind == CommentKind::Block && self.text.starts_with('*')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Closed set of construct kinds the detector understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConstructKind {
    Loop,
    Conditional,
    Call,
    Assignment,
    Declaration,
    Return,
    Throw,
    Try,
    Switch,
    Break,
    Continue,
    FunctionDef,
    ClassDef,
    Update { op: UpdateOp },
    /// No-op marker such as a lone `;`
    Empty,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstructId(pub u32);

impl ConstructId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construct {
    pub id: ConstructId,
    pub kind: ConstructKind,
    /// Captured identifier names, most specific first
    pub names: Vec<String>,
    /// Captured literal operands, as written
    pub literals: Vec<String>,
    pub span: Option<SourceSpan>,
    pub parent: Option<ConstructId>,
    pub children: Vec<ConstructId>,
}

impl Construct {
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn literal(&self) -> Option<&str> {
        self.literals.first().map(String::as_str)
    }

    pub fn start_line(&self) -> Option<usize> {
        self.span.map(|span| span.start.line)
    }
}

/// Arena of constructs for one parsed file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    constructs: Vec<Construct>,
    roots: Vec<ConstructId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a construct under `parent` (or as a root) and return its id
    pub fn push(
        &mut self,
        parent: Option<ConstructId>,
        kind: ConstructKind,
        names: Vec<String>,
        literals: Vec<String>,
        span: Option<SourceSpan>,
    ) -> ConstructId {
        let id = ConstructId(self.constructs.len() as u32);
        self.constructs.push(Construct {
            id,
            kind,
            names,
            literals,
            span,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.constructs[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: ConstructId) -> Option<&Construct> {
        self.constructs.get(id.index())
    }

    pub fn roots(&self) -> &[ConstructId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.constructs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
    }
}

/// Everything the detector needs from one source file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: String,
    pub tree: Arc<SyntaxTree>,
    /// Sorted by start offset
    pub comments: Vec<SourceComment>,
}

fn syntax_for(filename: &str) -> Syntax {
    let is_ts = [".ts", ".tsx", ".mts", ".cts"]
        .iter()
        .any(|ext| filename.ends_with(ext));
    if is_ts {
        Syntax::Typescript(TsSyntax {
            tsx: filename.ends_with(".tsx"),
            decorators: true,
            dts: filename.ends_with(".d.ts"),
            no_early_errors: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            ..Default::default()
        })
    }
}

/// Parse JS/TS source into a construct tree plus its comments
pub fn parse_file(source: &str, filename: &str) -> Result<ParsedFile> {
    // swc drops a leading BOM; positions are computed over the same text
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    GLOBALS.set(&Globals::new(), || {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Custom(filename.to_string()).into(), source.to_string());
        let base = fm.start_pos.0;
        let lines = LineIndex::new(source);

        let swc_comments = SingleThreadedComments::default();
        let mut parser = Parser::new(syntax_for(filename), StringInput::from(&*fm), Some(&swc_comments));

        let program = parser.parse_program().map_err(|err| {
            let offset = err.span().lo.0.saturating_sub(base) as usize;
            Error::Parse {
                path: filename.to_string(),
                message: format!("line {}: {:?}", lines.position(source, offset).line, err.kind()),
            }
        })?;
        for err in parser.take_errors() {
            tracing::debug!(path = filename, "recovered parse error: {:?}", err.kind());
        }

        let tree = lower::lower_program(&program, source, &lines, base);
        let comments = comments::collect(&swc_comments, source, &lines, base);

        Ok(ParsedFile {
            path: filename.to_string(),
            tree: Arc::new(tree),
            comments,
        })
    })
}

pub trait Visitor {
    fn enter(&mut self, _node: &Construct) {}
    fn exit(&mut self, _node: &Construct) {}
}

/// Depth-first walk over every construct, following child links only
pub fn traverse(tree: &SyntaxTree, visitor: &mut dyn Visitor) {
    for &root in tree.roots() {
        traverse_from(tree, root, visitor);
    }
}

fn traverse_from(tree: &SyntaxTree, id: ConstructId, visitor: &mut dyn Visitor) {
    let Some(node) = tree.get(id) else {
        return;
    };
    visitor.enter(node);
    for &child in &node.children {
        traverse_from(tree, child, visitor);
    }
    visitor.exit(node);
}
