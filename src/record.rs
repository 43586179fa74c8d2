//! Record and key-ordering traits.

use std::cmp::Ordering;

/// A record that can be indexed by the tree.
///
/// The tree only ever holds `&R`; the key is read through [`Keyed::key`]
/// whenever an entry is compared, and cloned once per separator.
pub trait Keyed {
    /// Key type the record is ordered by.
    type Key: Clone;

    fn key(&self) -> &Self::Key;
}

impl<K: Clone, V> Keyed for (K, V) {
    type Key = K;

    #[inline]
    fn key(&self) -> &K {
        &self.0
    }
}

/// Total order over keys.
pub trait Comparator<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<K: Ord> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders keys with a closure.
///
/// ```rust
/// use bplus_rs::{BPlusTree, ByFn};
///
/// let descending = ByFn(|a: &u32, b: &u32| b.cmp(a));
/// let records = [(1u32, "a"), (3, "c"), (2, "b")];
/// let mut tree: BPlusTree<'_, (u32, &str), _, 4> = BPlusTree::with_comparator(descending);
/// for r in &records {
///     tree.insert(r).unwrap();
/// }
/// let keys: Vec<u32> = tree.iter().map(|r| r.0).collect();
/// assert_eq!(keys, vec![3, 2, 1]);
/// ```
#[derive(Clone, Copy)]
pub struct ByFn<F>(pub F);

impl<K, F> Comparator<K> for ByFn<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> std::fmt::Debug for ByFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ByFn(..)")
    }
}
