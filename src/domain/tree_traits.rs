use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::tree::{SearchSpaceTree, TreeNode};

pub const ROOT_LABEL: &str = "<root>";

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode) -> String {
    match node.mutable.as_ref() {
        Some(m) => format!("{} ({})", m.key(), m.kind()),
        None => ROOT_LABEL.to_string(),
    }
}

impl TreeNodeConvert for SearchSpaceTree {
    /// Builds bottom-up in post-order: when a node is finished, its
    /// children's subtrees are the last entries of `done`.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let mut done: Vec<Tree<String>> = Vec::new();
        let mut stack: Vec<(Index, bool)> = vec![(self.root(), false)];
        while let Some((idx, expanded)) = stack.pop() {
            let Some(node) = self.get_node(idx) else {
                continue;
            };
            if expanded {
                let first = done.len().saturating_sub(node.children.len());
                let leaves = done.split_off(first);
                done.push(Tree::new(label(node)).with_leaves(leaves));
            } else {
                stack.push((idx, true));
                stack.extend(node.children.iter().rev().map(|&child| (child, false)));
            }
        }
        done.pop().unwrap_or_else(|| Tree::new(ROOT_LABEL.to_string()))
    }
}
