use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::cache::IdentityCache;
use crate::parser::{traverse, Construct, ConstructId, SyntaxTree, Visitor};

/// Start line -> constructs beginning on that line, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeIndex {
    lines: FxHashMap<usize, Vec<ConstructId>>,
}

/// Identity-scoped cache of node indexes, one per live syntax tree
pub type NodeIndexCache = IdentityCache<SyntaxTree, Arc<NodeIndex>>;

struct LineCollector<'a> {
    lines: &'a mut FxHashMap<usize, Vec<ConstructId>>,
}

impl Visitor for LineCollector<'_> {
    fn enter(&mut self, node: &Construct) {
        if let Some(line) = node.start_line() {
            self.lines.entry(line).or_default().push(node.id);
        }
    }
}

impl NodeIndex {
    /// Index every positioned construct of `tree` under its start line
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut lines = FxHashMap::default();
        traverse(tree, &mut LineCollector { lines: &mut lines });
        Self { lines }
    }

    /// Cached index for `tree`, built on first request
    pub fn for_tree(cache: &NodeIndexCache, tree: &Arc<SyntaxTree>) -> Arc<NodeIndex> {
        cache.get_or_insert_with(tree, || {
            tracing::trace!(constructs = tree.len(), "building node index");
            Arc::new(Self::build(tree))
        })
    }

    /// Constructs starting on `line`; empty when none do
    pub fn at_line(&self, line: usize) -> &[ConstructId] {
        self.lines.get(&line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of indexed lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
