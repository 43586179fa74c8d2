use crate::node::{Node, NodeId};
use crate::{AllocationError, BPlusTree, Comparator, Keyed, NaturalOrder, TreeConfig};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;

/// Check every structural invariant of `t`, panicking on the first violation.
pub(crate) fn validate_tree<R, C, const ORDER: usize>(t: &BPlusTree<'_, R, C, ORDER>)
where
    R: Keyed,
    C: Comparator<R::Key>,
{
    let max_keys = ORDER - 1;
    let cmp = &t.cmp;

    let Some(root) = t.root else {
        assert!(t.head.is_none() && t.tail.is_none(), "empty tree with a leaf chain");
        assert_eq!(t.count, 0);
        assert_eq!(t.height, 0);
        assert_eq!(t.leaves, 0);
        assert_eq!(t.nodes.len(), 0, "empty tree must not hold nodes");
        return;
    };

    // (node, depth, lower bound, upper bound); children pushed right to left
    // so leaves pop in key order.
    let mut stack: Vec<(NodeId, usize, Option<&R::Key>, Option<&R::Key>)> =
        vec![(root, 1, None, None)];
    let mut tree_leaves: Vec<NodeId> = Vec::new();
    let mut visited = 0usize;

    let in_bounds = |k: &R::Key, lo: Option<&R::Key>, hi: Option<&R::Key>| {
        lo.map_or(true, |lo| cmp.compare(lo, k) != Ordering::Greater)
            && hi.map_or(true, |hi| cmp.compare(k, hi) != Ordering::Greater)
    };

    while let Some((id, depth, lo, hi)) = stack.pop() {
        visited += 1;
        match t.nodes.get(id) {
            Node::Leaf(leaf) => {
                assert_eq!(depth, t.height, "leaf {id} at depth {depth}");
                assert!(
                    (1..=max_keys).contains(&leaf.len()),
                    "leaf {id} holds {} entries",
                    leaf.len()
                );
                for pair in leaf.entries.windows(2) {
                    assert_ne!(
                        cmp.compare(pair[0].key(), pair[1].key()),
                        Ordering::Greater,
                        "leaf {id} out of order"
                    );
                }
                for e in &leaf.entries {
                    assert!(in_bounds(e.key(), lo, hi), "leaf {id} entry outside parent range");
                }
                tree_leaves.push(id);
            }
            Node::Internal(node) => {
                assert!(depth < t.height, "internal node {id} at leaf depth");
                assert!(
                    (1..=max_keys).contains(&node.keys.len()),
                    "internal node {id} holds {} separators",
                    node.keys.len()
                );
                assert_eq!(node.children.len(), node.keys.len() + 1, "node {id} fanout");
                for pair in node.keys.windows(2) {
                    assert_ne!(
                        cmp.compare(&pair[0], &pair[1]),
                        Ordering::Greater,
                        "node {id} separators out of order"
                    );
                }
                for k in &node.keys {
                    assert!(in_bounds(k, lo, hi), "node {id} separator outside parent range");
                }
                for (i, &child) in node.children.iter().enumerate().rev() {
                    let child_lo = if i == 0 { lo } else { Some(&node.keys[i - 1]) };
                    let child_hi = node.keys.get(i).or(hi);
                    stack.push((child, depth + 1, child_lo, child_hi));
                }
            }
        }
    }
    assert_eq!(visited, t.nodes.len(), "unreachable nodes in the arena");
    assert_eq!(tree_leaves.len(), t.leaves);

    // The chain must list exactly the reachable leaves, in the same order.
    let mut chain = Vec::new();
    let mut prev: Option<NodeId> = None;
    let mut cursor = t.head;
    let mut records = 0usize;
    while let Some(id) = cursor {
        let leaf = t.nodes.leaf(id);
        assert_eq!(leaf.prev, prev, "leaf {id} has a stale prev link");
        records += leaf.len();
        chain.push(id);
        prev = Some(id);
        cursor = leaf.next;
        assert!(chain.len() <= tree_leaves.len(), "leaf chain does not terminate");
    }
    assert_eq!(t.tail, prev, "tail is not the last leaf");
    assert_eq!(chain, tree_leaves, "leaf chain disagrees with tree order");
    assert_eq!(records, t.count, "chain record count must match len");
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 6)]
    Insert(#[proptest(strategy = "0u16..64")] u16),
    #[proptest(weight = 2)]
    Search(#[proptest(strategy = "0u16..64")] u16),
    IterFrom(#[proptest(strategy = "0u16..64")] u16),
}

type Rec = (u16, usize);

/// Run `ops` against a tree and against a stably sorted `Vec`.
fn check_ops<const ORDER: usize>(ops: &[Op]) -> Result<(), TestCaseError> {
    // Records must outlive the tree, so build them all first.
    let records: Vec<Rec> = ops
        .iter()
        .enumerate()
        .filter_map(|(i, op)| match op {
            Op::Insert(k) => Some((*k, i)),
            _ => None,
        })
        .collect();
    let mut inserts = records.iter();

    let mut t: BPlusTree<'_, Rec, NaturalOrder, ORDER> = BPlusTree::new();
    let mut model: Vec<&Rec> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(_) => {
                let Some(r) = inserts.next() else {
                    unreachable!("one record per insert op");
                };
                t.insert(r).map_err(|e| TestCaseError::fail(e.to_string()))?;
                let pos = model.partition_point(|m| m.0 <= r.0);
                model.insert(pos, r);
            }
            Op::Search(k) => {
                let got = t.search(k);
                let expected = model.iter().find(|m| m.0 == *k).copied();
                prop_assert_eq!(got, expected);
                prop_assert_eq!(t.contains_key(k), expected.is_some());
            }
            Op::IterFrom(k) => {
                let got: Vec<&Rec> = t.iter_from(k).collect();
                let expected: Vec<&Rec> = model.iter().filter(|m| m.0 >= *k).copied().collect();
                prop_assert_eq!(got, expected);
            }
        }
        prop_assert_eq!(t.len(), model.len());
    }

    validate_tree(&t);
    let forward: Vec<&Rec> = t.iter().collect();
    prop_assert_eq!(&forward, &model);
    let mut backward: Vec<&Rec> = t.iter().rev().collect();
    backward.reverse();
    prop_assert_eq!(&backward, &model);

    let mut visited = Vec::new();
    t.iterate(|r| visited.push(r));
    prop_assert_eq!(visited, model);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_model_order_3(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        check_ops::<3>(&ops)?;
    }

    #[test]
    fn prop_model_order_4(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        check_ops::<4>(&ops)?;
    }

    #[test]
    fn prop_model_order_7(ops in prop::collection::vec(any::<Op>(), 0..=600)) {
        check_ops::<7>(&ops)?;
    }

    #[test]
    fn prop_invariants_after_every_insert(keys in prop::collection::vec(any::<i32>(), 0..=200)) {
        let records: Vec<(i32, ())> = keys.iter().map(|&k| (k, ())).collect();
        let mut t: BPlusTree<'_, (i32, ()), NaturalOrder, 4> = BPlusTree::new();
        for r in &records {
            t.insert(r).unwrap();
            validate_tree(&t);
        }
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        let got: Vec<i32> = t.iter().map(|r| r.0).collect();
        prop_assert_eq!(got, sorted);
    }

    #[test]
    fn prop_node_limit_never_corrupts(
        keys in prop::collection::vec(0u8..32, 1..=120),
        limit in 1usize..24,
    ) {
        let records: Vec<(u8, usize)> = keys.iter().copied().zip(0..).collect();
        let mut t: BPlusTree<'_, (u8, usize), NaturalOrder, 3> =
            BPlusTree::with_config(TreeConfig::new().max_nodes(limit));
        let mut model: Vec<&(u8, usize)> = Vec::new();

        for r in &records {
            let nodes = t.node_count();
            match t.insert(r) {
                Ok(()) => {
                    let pos = model.partition_point(|m| m.0 <= r.0);
                    model.insert(pos, r);
                }
                Err(err) => {
                    prop_assert_eq!(err, AllocationError::NodeLimit { limit });
                    prop_assert_eq!(t.node_count(), nodes);
                }
            }
            prop_assert!(t.node_count() <= limit);
        }

        validate_tree(&t);
        let got: Vec<&(u8, usize)> = t.iter().collect();
        prop_assert_eq!(got, model);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    // Two duplicate pairs so ties meet every split position.
    let records: Vec<(u8, char)> = vec![(1, 'a'), (2, 'b'), (2, 'c'), (3, 'd'), (4, 'e'), (4, 'f'), (5, 'g')];

    for_each_permutation(&records, |perm| {
        let mut t: BPlusTree<'_, (u8, char), NaturalOrder, 3> = BPlusTree::new();
        for r in &perm {
            t.insert(r).unwrap();
        }
        validate_tree(&t);

        let mut expected = perm.clone();
        expected.sort_by_key(|r| r.0);
        let got: Vec<(u8, char)> = t.iter().copied().collect();
        assert_eq!(got, expected);
        for k in 1..=5 {
            assert_eq!(t.search(&k), expected.iter().find(|r| r.0 == k));
        }
    });
}

#[test]
fn exhaustive_fanouts_ascending() {
    fn run<const ORDER: usize>() {
        let records: Vec<(u32, u32)> = (0..300).map(|k| (k, k)).collect();
        let mut t: BPlusTree<'_, (u32, u32), NaturalOrder, ORDER> = BPlusTree::new();
        let mut last_height = 0;
        for r in &records {
            t.insert(r).unwrap();
            assert!(t.height() == last_height || t.height() == last_height + 1);
            last_height = t.height();
        }
        validate_tree(&t);
        assert!(t.iter().map(|r| r.0).eq(0..300));
    }

    run::<3>();
    run::<4>();
    run::<5>();
    run::<8>();
    run::<16>();
    run::<64>();
}
