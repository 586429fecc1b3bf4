//! Traversal properties of SearchSpaceTree

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use generational_arena::Index;
use rstest::{fixture, rstest};

use nasutil::domain::{
    Choice, Mutable, MutableKind, MutableRef, SearchSpaceTree, TraversalOrder,
};
use nasutil::util::testing::{init_test_setup, layer, sample_tree, scope};

fn keys<'a>(it: impl Iterator<Item = &'a MutableRef>) -> Vec<String> {
    it.map(|m| m.key().to_string()).collect()
}

/// Root -> s1 -> (x, s2 -> (y, x)), s3 -> (z), w
///
/// The second `x` is a distinct node sharing the key of the first.
#[fixture]
fn wide_tree() -> SearchSpaceTree {
    init_test_setup();
    let mut tree = SearchSpaceTree::new();
    let root = tree.root();
    let s1 = tree.add_child(root, scope("s1")).unwrap();
    tree.add_child(s1, layer("x")).unwrap();
    let s2 = tree.add_child(s1, scope("s2")).unwrap();
    tree.add_child(s2, layer("y")).unwrap();
    tree.add_child(s2, layer("x")).unwrap();
    let s3 = tree.add_child(root, scope("s3")).unwrap();
    tree.add_child(s3, layer("z")).unwrap();
    tree.add_child(root, layer("w")).unwrap();
    tree
}

// ============================================================
// Worked example
// ============================================================

#[rstest]
#[case(TraversalOrder::Pre, vec!["a", "c", "b"])]
#[case(TraversalOrder::Post, vec!["c", "a", "b"])]
fn given_sample_tree_when_traversing_deduplicated_then_matches_expected(
    #[case] order: TraversalOrder,
    #[case] expected: Vec<&str>,
) {
    init_test_setup();
    let tree = sample_tree();
    assert_eq!(keys(tree.traverse(tree.root(), order, true)), expected);
}

#[rstest]
fn given_tree_when_iterating_then_defaults_to_pre_order_dedup() {
    let tree = sample_tree();
    let via_into_iter: Vec<String> = (&tree).into_iter().map(|m| m.key().to_string()).collect();
    assert_eq!(via_into_iter, vec!["a", "c", "b"]);

    let mut count = 0;
    for _ in &tree {
        count += 1;
    }
    assert_eq!(count, 3);
}

// ============================================================
// Ordering properties
// ============================================================

/// Map each non-root node to its ancestors (excluding the root).
fn ancestors(tree: &SearchSpaceTree) -> HashMap<Index, Vec<Index>> {
    let mut result = HashMap::new();
    let mut stack = vec![(tree.root(), Vec::new())];
    while let Some((idx, path)) = stack.pop() {
        let node = tree.get_node(idx).unwrap();
        for &child in &node.children {
            let mut child_path = path.clone();
            if idx != tree.root() {
                child_path.push(idx);
            }
            result.insert(child, child_path.clone());
            stack.push((child, child_path));
        }
    }
    result
}

fn position_of(seq: &[MutableRef], target: &MutableRef) -> usize {
    seq.iter().position(|m| Rc::ptr_eq(m, target)).unwrap()
}

#[rstest]
fn given_no_dedup_when_pre_order_then_ancestors_come_first(wide_tree: SearchSpaceTree) {
    let seq: Vec<MutableRef> = wide_tree
        .traverse(wide_tree.root(), TraversalOrder::Pre, false)
        .cloned()
        .collect();
    for (node_idx, path) in ancestors(&wide_tree) {
        let node = wide_tree.get_node(node_idx).unwrap().mutable.as_ref().unwrap();
        for ancestor_idx in path {
            let ancestor = wide_tree.get_node(ancestor_idx).unwrap().mutable.as_ref().unwrap();
            assert!(position_of(&seq, ancestor) < position_of(&seq, node));
        }
    }
}

#[rstest]
fn given_no_dedup_when_post_order_then_ancestors_come_last(wide_tree: SearchSpaceTree) {
    let seq: Vec<MutableRef> = wide_tree
        .traverse(wide_tree.root(), TraversalOrder::Post, false)
        .cloned()
        .collect();
    for (node_idx, path) in ancestors(&wide_tree) {
        let node = wide_tree.get_node(node_idx).unwrap().mutable.as_ref().unwrap();
        for ancestor_idx in path {
            let ancestor = wide_tree.get_node(ancestor_idx).unwrap().mutable.as_ref().unwrap();
            assert!(position_of(&seq, ancestor) > position_of(&seq, node));
        }
    }
}

#[rstest]
#[case(TraversalOrder::Pre)]
#[case(TraversalOrder::Post)]
fn given_no_dedup_when_traversing_then_every_node_appears_exactly_once(
    wide_tree: SearchSpaceTree,
    #[case] order: TraversalOrder,
) {
    let seq: Vec<MutableRef> = wide_tree
        .traverse(wide_tree.root(), order, false)
        .cloned()
        .collect();
    assert_eq!(seq.len(), wide_tree.len() - 1);

    let ptrs: HashSet<*const ()> = seq.iter().map(|m| Rc::as_ptr(m) as *const ()).collect();
    assert_eq!(ptrs.len(), seq.len());
}

// ============================================================
// Deduplication
// ============================================================

#[rstest]
#[case(TraversalOrder::Pre, false, vec!["s1", "x", "s2", "y", "x", "s3", "z", "w"])]
#[case(TraversalOrder::Pre, true, vec!["s1", "x", "s2", "y", "s3", "z", "w"])]
#[case(TraversalOrder::Post, false, vec!["x", "y", "x", "s2", "s1", "z", "s3", "w"])]
#[case(TraversalOrder::Post, true, vec!["x", "y", "s2", "s1", "z", "s3", "w"])]
fn given_repeated_key_when_traversing_then_dedup_keeps_first_occurrence(
    wide_tree: SearchSpaceTree,
    #[case] order: TraversalOrder,
    #[case] deduplicate: bool,
    #[case] expected: Vec<&str>,
) {
    assert_eq!(
        keys(wide_tree.traverse(wide_tree.root(), order, deduplicate)),
        expected
    );
}

#[rstest]
fn given_dedup_when_first_occurrence_differs_by_order_then_keeps_the_right_instance() {
    // pre-order meets `dup` under p first; post-order meets the one under q first
    let mut tree = SearchSpaceTree::new();
    let root = tree.root();
    let first: MutableRef = Rc::new(Choice::new("dup", MutableKind::MutableScope));
    let second: MutableRef = Rc::new(Choice::new("dup", MutableKind::LayerChoice));
    let p = tree.add_child(root, Rc::clone(&first)).unwrap();
    tree.add_child(p, Rc::clone(&second)).unwrap();

    let pre: Vec<_> = tree.traverse(root, TraversalOrder::Pre, true).cloned().collect();
    assert_eq!(pre.len(), 1);
    assert!(Rc::ptr_eq(&pre[0], &first));

    let post: Vec<_> = tree.traverse(root, TraversalOrder::Post, true).cloned().collect();
    assert_eq!(post.len(), 1);
    assert!(Rc::ptr_eq(&post[0], &second));
}

#[rstest]
fn given_restarted_traversal_then_seen_keys_are_fresh(wide_tree: SearchSpaceTree) {
    let first = keys(wide_tree.traverse(wide_tree.root(), TraversalOrder::Pre, true));
    let second = keys(wide_tree.traverse(wide_tree.root(), TraversalOrder::Pre, true));
    assert_eq!(first, second);
}

#[rstest]
fn given_shared_memo_when_walking_twice_then_second_walk_skips_seen(wide_tree: SearchSpaceTree) {
    let mut memo = HashSet::new();
    let first = keys(wide_tree.traverse_with_memo(
        wide_tree.root(),
        TraversalOrder::Pre,
        true,
        &mut memo,
    ));
    assert_eq!(first.len(), 7);
    assert_eq!(memo.len(), 7);

    let second = keys(wide_tree.traverse_with_memo(
        wide_tree.root(),
        TraversalOrder::Pre,
        true,
        &mut memo,
    ));
    assert!(second.is_empty());
}

#[rstest]
fn given_prefilled_memo_when_walking_then_those_keys_are_skipped(wide_tree: SearchSpaceTree) {
    let mut memo: HashSet<String> = ["s2".to_string(), "w".to_string()].into_iter().collect();
    let walked = keys(wide_tree.traverse_with_memo(
        wide_tree.root(),
        TraversalOrder::Pre,
        true,
        &mut memo,
    ));
    assert_eq!(walked, vec!["s1", "x", "y", "s3", "z"]);
}

#[rstest]
fn given_lazy_traversal_when_taking_prefix_then_stops_early(wide_tree: SearchSpaceTree) {
    let mut it = wide_tree.traverse(wide_tree.root(), TraversalOrder::Pre, true);
    assert_eq!(it.next().map(|m| m.key().to_string()), Some("s1".to_string()));
    assert_eq!(it.next().map(|m| m.kind()), Some(MutableKind::LayerChoice));
}

// ============================================================
// Node type
// ============================================================

#[rstest]
fn given_nodes_when_asking_type_then_root_is_none(wide_tree: SearchSpaceTree) {
    let root = wide_tree.root();
    assert_eq!(wide_tree.node_type(root), None);
    let first_child = wide_tree.get_node(root).unwrap().children[0];
    assert_eq!(wide_tree.node_type(first_child), Some(MutableKind::MutableScope));
    assert_eq!(wide_tree.depth(), 4);
    assert_eq!(wide_tree.leaf_keys(), vec!["x", "y", "x", "z", "w"]);
}
