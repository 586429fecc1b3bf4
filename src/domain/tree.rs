use std::borrow::BorrowMut;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::mutable::{Mutable, MutableKind};

/// Shared handle to an externally-owned mutable.
pub type MutableRef = Rc<dyn Mutable>;

/// Whether a node's own mutable is emitted before or after its subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    #[default]
    Pre,
    Post,
}

impl fmt::Display for TraversalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalOrder::Pre => f.write_str("pre"),
            TraversalOrder::Post => f.write_str("post"),
        }
    }
}

impl FromStr for TraversalOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre" => Ok(TraversalOrder::Pre),
            "post" => Ok(TraversalOrder::Post),
            other => Err(DomainError::InvalidTraversalOrder(other.to_string())),
        }
    }
}

/// Tree node in the arena-based search space.
#[derive(Debug)]
pub struct TreeNode {
    /// Decision point held by this node, None for the root
    pub mutable: Option<MutableRef>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn node_type(&self) -> Option<MutableKind> {
        self.mutable.as_ref().map(|m| m.kind())
    }

    pub fn key(&self) -> Option<&str> {
        self.mutable.as_deref().map(|m| m.key())
    }
}

/// Structured representation of a search space.
///
/// The root holds no mutable and only serves as an attachment point. Every
/// other node wraps one mutable; scopes become inner nodes and their
/// contents become children, in the order they were declared.
#[derive(Debug)]
pub struct SearchSpaceTree {
    arena: Arena<TreeNode>,
    root: Index,
}

impl Default for SearchSpaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSpaceTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            mutable: None,
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    /// Append a new node wrapping `mutable` to the children of `parent`.
    ///
    /// Returns the index of the new node so sub-trees can be built from it.
    /// Key uniqueness is not checked here.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: Index, mutable: MutableRef) -> DomainResult<Index> {
        if !self.arena.contains(parent) {
            return Err(DomainError::NodeNotFound(format!("{:?}", parent)));
        }
        let node_idx = self.arena.insert(TreeNode {
            mutable: Some(mutable),
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(node_idx);
        }
        Ok(node_idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Kind of the mutable at `idx`; None for the root.
    pub fn node_type(&self, idx: Index) -> Option<MutableKind> {
        self.get_node(idx).and_then(TreeNode::node_type)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when nothing but the root is present.
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 1
    }

    /// Number of levels, root included.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((idx, level)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                max_depth = max_depth.max(level);
                stack.extend(node.children.iter().map(|&child| (child, level + 1)));
            }
        }
        max_depth
    }

    /// Keys of all leaves carrying a mutable, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_keys(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.get_node(idx) else {
                continue;
            };
            if node.children.is_empty() {
                if let Some(key) = node.key() {
                    leaves.push(key.to_string());
                }
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }

    /// Lazily walk the subtree at `start`, yielding mutables.
    ///
    /// With `deduplicate`, a mutable whose key was already yielded is skipped.
    /// Each call starts with an empty set of seen keys.
    pub fn traverse(
        &self,
        start: Index,
        order: TraversalOrder,
        deduplicate: bool,
    ) -> Traversal<'_, HashSet<String>> {
        Traversal::new(self, start, order, deduplicate, HashSet::new())
    }

    /// Like [`traverse`](Self::traverse) but records seen keys in `memo`,
    /// so several walks can share one deduplication scope.
    pub fn traverse_with_memo<'a>(
        &'a self,
        start: Index,
        order: TraversalOrder,
        deduplicate: bool,
        memo: &'a mut HashSet<String>,
    ) -> Traversal<'a, &'a mut HashSet<String>> {
        Traversal::new(self, start, order, deduplicate, memo)
    }

    /// Pre-order, deduplicated walk from the root.
    pub fn iter(&self) -> Traversal<'_, HashSet<String>> {
        self.traverse(self.root, TraversalOrder::Pre, true)
    }
}

impl<'a> IntoIterator for &'a SearchSpaceTree {
    type Item = &'a MutableRef;
    type IntoIter = Traversal<'a, HashSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Stack-based traversal state.
///
/// `M` owns or borrows the set of keys already yielded.
pub struct Traversal<'a, M = HashSet<String>> {
    tree: &'a SearchSpaceTree,
    // (node, children already pushed); the flag only matters for post-order
    stack: Vec<(Index, bool)>,
    order: TraversalOrder,
    deduplicate: bool,
    memo: M,
}

impl<'a, M> Traversal<'a, M>
where
    M: BorrowMut<HashSet<String>>,
{
    fn new(
        tree: &'a SearchSpaceTree,
        start: Index,
        order: TraversalOrder,
        deduplicate: bool,
        memo: M,
    ) -> Self {
        let mut stack = Vec::new();
        if tree.arena.contains(start) {
            stack.push((start, false));
        }
        Self {
            tree,
            stack,
            order,
            deduplicate,
            memo,
        }
    }

    fn admit(&mut self, node: &'a TreeNode) -> Option<&'a MutableRef> {
        let mutable = node.mutable.as_ref()?;
        let memo: &mut HashSet<String> = self.memo.borrow_mut();
        if self.deduplicate && memo.contains(mutable.key()) {
            return None;
        }
        memo.insert(mutable.key().to_string());
        Some(mutable)
    }
}

impl<'a, M> Iterator for Traversal<'a, M>
where
    M: BorrowMut<HashSet<String>>,
{
    type Item = &'a MutableRef;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some((current_idx, expanded)) = self.stack.pop() {
            let Some(node) = tree.get_node(current_idx) else {
                continue;
            };
            match (self.order, expanded) {
                (TraversalOrder::Pre, _) => {
                    // Push children in reverse order for left-to-right traversal
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                }
                (TraversalOrder::Post, false) => {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                    continue;
                }
                (TraversalOrder::Post, true) => {}
            }
            if let Some(mutable) = self.admit(node) {
                return Some(mutable);
            }
        }
        None
    }
}
