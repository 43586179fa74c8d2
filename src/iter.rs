//! Walks over the leaf chain.

use std::iter::FusedIterator;

use crate::node::{Leaf, NodeArena, NodeId};
use crate::record::Keyed;

/// Records in key order, front to back or back to front.
///
/// Created by [`BPlusTree::iter`](crate::BPlusTree::iter).
pub struct Iter<'a, 'r, R: Keyed> {
    nodes: &'a NodeArena<'r, R>,
    /// Leaf and index of the next record from the front.
    front: Option<(NodeId, usize)>,
    /// Leaf and one-past index of the next record from the back.
    back: Option<(NodeId, usize)>,
    remaining: usize,
}

impl<'a, 'r, R: Keyed> Iter<'a, 'r, R> {
    pub(crate) fn new(
        nodes: &'a NodeArena<'r, R>,
        head: Option<NodeId>,
        tail: Option<NodeId>,
        len: usize,
    ) -> Self {
        Self {
            nodes,
            front: head.map(|id| (id, 0)),
            back: tail.map(|id| (id, nodes.leaf(id).len())),
            remaining: len,
        }
    }
}

impl<'a, 'r, R: Keyed> Iterator for Iter<'a, 'r, R> {
    type Item = &'r R;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while let Some((id, idx)) = self.front {
            let leaf = self.nodes.leaf(id);
            if let Some(&record) = leaf.entries.get(idx) {
                self.front = Some((id, idx + 1));
                self.remaining -= 1;
                return Some(record);
            }
            self.front = leaf.next.map(|next| (next, 0));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, 'r, R: Keyed> DoubleEndedIterator for Iter<'a, 'r, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while let Some((id, end)) = self.back {
            let leaf = self.nodes.leaf(id);
            if end > 0 {
                self.back = Some((id, end - 1));
                self.remaining -= 1;
                return Some(leaf.entries[end - 1]);
            }
            self.back = leaf.prev.map(|prev| (prev, self.nodes.leaf(prev).len()));
        }
        None
    }
}

impl<'a, 'r, R: Keyed> ExactSizeIterator for Iter<'a, 'r, R> {}

impl<'a, 'r, R: Keyed> FusedIterator for Iter<'a, 'r, R> {}

/// Forward walk starting at a lower bound.
///
/// Created by [`BPlusTree::iter_from`](crate::BPlusTree::iter_from).
pub struct Range<'a, 'r, R: Keyed> {
    nodes: &'a NodeArena<'r, R>,
    cursor: Option<(NodeId, usize)>,
}

impl<'a, 'r, R: Keyed> Range<'a, 'r, R> {
    pub(crate) fn new(nodes: &'a NodeArena<'r, R>, cursor: Option<(NodeId, usize)>) -> Self {
        Self { nodes, cursor }
    }
}

impl<'a, 'r, R: Keyed> Iterator for Range<'a, 'r, R> {
    type Item = &'r R;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, idx)) = self.cursor {
            let leaf = self.nodes.leaf(id);
            if let Some(&record) = leaf.entries.get(idx) {
                self.cursor = Some((id, idx + 1));
                return Some(record);
            }
            self.cursor = leaf.next.map(|next| (next, 0));
        }
        None
    }
}

impl<'a, 'r, R: Keyed> FusedIterator for Range<'a, 'r, R> {}

/// Read-only view of one leaf.
pub struct LeafRef<'a, 'r, R: Keyed> {
    nodes: &'a NodeArena<'r, R>,
    id: NodeId,
}

impl<'a, 'r, R: Keyed> LeafRef<'a, 'r, R> {
    pub(crate) fn new(nodes: &'a NodeArena<'r, R>, id: NodeId) -> Self {
        Self { nodes, id }
    }

    #[inline]
    fn leaf(&self) -> &'a Leaf<'r, R> {
        self.nodes.leaf(self.id)
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// Records in this leaf, sorted by key.
    pub fn entries(&self) -> &'a [&'r R] {
        &self.leaf().entries
    }

    pub fn len(&self) -> usize {
        self.leaf().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf().entries.is_empty()
    }

    /// Following leaf in the chain.
    pub fn next_leaf(&self) -> Option<Self> {
        self.leaf().next.map(|id| Self::new(self.nodes, id))
    }

    /// Preceding leaf in the chain.
    pub fn prev_leaf(&self) -> Option<Self> {
        self.leaf().prev.map(|id| Self::new(self.nodes, id))
    }
}

impl<'a, 'r, R: Keyed> Clone for LeafRef<'a, 'r, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, 'r, R: Keyed> Copy for LeafRef<'a, 'r, R> {}

impl<'a, 'r, R: Keyed> PartialEq for LeafRef<'a, 'r, R> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.nodes, other.nodes) && self.id() == other.id()
    }
}

impl<'a, 'r, R: Keyed + std::fmt::Debug> std::fmt::Debug for LeafRef<'a, 'r, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafRef")
            .field("id", &self.id)
            .field("entries", &self.entries())
            .finish()
    }
}

/// Leaves in chain order.
///
/// Created by [`BPlusTree::leaves`](crate::BPlusTree::leaves).
pub struct Leaves<'a, 'r, R: Keyed> {
    nodes: &'a NodeArena<'r, R>,
    next: Option<NodeId>,
}

impl<'a, 'r, R: Keyed> Leaves<'a, 'r, R> {
    pub(crate) fn new(nodes: &'a NodeArena<'r, R>, head: Option<NodeId>) -> Self {
        Self { nodes, next: head }
    }
}

impl<'a, 'r, R: Keyed> Iterator for Leaves<'a, 'r, R> {
    type Item = LeafRef<'a, 'r, R>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.nodes.leaf(id).next;
        Some(LeafRef::new(self.nodes, id))
    }
}

impl<'a, 'r, R: Keyed> FusedIterator for Leaves<'a, 'r, R> {}
