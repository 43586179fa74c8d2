//! Reader-writer wrapper for sharing one tree between threads.
//!
//! [`BPlusTree`] has no internal synchronization. `SharedTree` provides the
//! external exclusion it needs: inserts take the write lock, lookups and
//! walks take the read lock, so no reader ever sees a split half-done.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::Result;
use crate::record::{Comparator, Keyed, NaturalOrder};
use crate::tree::{BPlusTree, DEFAULT_ORDER};

/// A [`BPlusTree`] behind a `parking_lot::RwLock`.
///
/// ```rust
/// use bplus_rs::{BPlusTree, SharedTree};
///
/// let records: Vec<(u32, u32)> = (0..100).map(|i| (i, i * i)).collect();
/// let shared: SharedTree<'_, (u32, u32)> = SharedTree::new(BPlusTree::new());
///
/// std::thread::scope(|s| {
///     for chunk in records.chunks(25) {
///         let shared = &shared;
///         s.spawn(move || {
///             for r in chunk {
///                 shared.insert(r).unwrap();
///             }
///         });
///     }
/// });
///
/// assert_eq!(shared.len(), 100);
/// assert_eq!(shared.search(&9), Some(&(9, 81)));
/// ```
pub struct SharedTree<'r, R: Keyed, C = NaturalOrder, const ORDER: usize = DEFAULT_ORDER> {
    inner: RwLock<BPlusTree<'r, R, C, ORDER>>,
}

impl<'r, R: Keyed, C, const ORDER: usize> SharedTree<'r, R, C, ORDER> {
    pub fn new(tree: BPlusTree<'r, R, C, ORDER>) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Hold the read lock for a longer walk.
    pub fn read(&self) -> RwLockReadGuard<'_, BPlusTree<'r, R, C, ORDER>> {
        self.inner.read()
    }

    /// Visit every record in key order under one read lock.
    pub fn iterate<F>(&self, visit: F)
    where
        F: FnMut(&'r R),
    {
        self.inner.read().iterate(visit);
    }

    pub fn into_inner(self) -> BPlusTree<'r, R, C, ORDER> {
        self.inner.into_inner()
    }
}

impl<'r, R, C, const ORDER: usize> SharedTree<'r, R, C, ORDER>
where
    R: Keyed,
    C: Comparator<R::Key>,
{
    pub fn insert(&self, record: &'r R) -> Result<()> {
        self.inner.write().insert(record)
    }

    /// Returned references borrow the records, not the lock.
    pub fn search(&self, key: &R::Key) -> Option<&'r R> {
        self.inner.read().search(key)
    }
}

impl<'r, R: Keyed, C: Default, const ORDER: usize> Default for SharedTree<'r, R, C, ORDER> {
    fn default() -> Self {
        Self::new(BPlusTree::new())
    }
}
