//! Node store: fixed-capacity leaf and internal nodes in an index arena.
//!
//! Nodes are addressed by [`NodeId`]. Every node's buffers are reserved to
//! their final capacity when the node is built, so moving entries between
//! nodes during a split never touches the allocator. All allocation happens
//! through the fallible `try_*` constructors, before a mutation starts.

use std::cmp::Ordering;

use crate::error::{AllocationError, Result};
use crate::record::{Comparator, Keyed};

/// Handle of a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Leaf
// =============================================================================

/// Sorted record references plus the node's position in the leaf chain.
pub(crate) struct Leaf<'r, R> {
    pub(crate) entries: Vec<&'r R>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl<'r, R: Keyed> Leaf<'r, R> {
    /// Empty, unlinked leaf able to hold `capacity` entries without growing.
    pub(crate) fn try_new(capacity: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity)?;
        Ok(Self {
            entries,
            prev: None,
            next: None,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert after every entry whose key is `<=` the record's key.
    pub(crate) fn insert_sorted<C: Comparator<R::Key>>(&mut self, record: &'r R, cmp: &C) {
        debug_assert!(self.entries.len() < self.entries.capacity());
        let key = record.key();
        let pos = self
            .entries
            .partition_point(|e| cmp.compare(e.key(), key) != Ordering::Greater);
        self.entries.insert(pos, record);
    }

    /// Index of the first entry whose key is `>= key`.
    pub(crate) fn lower_bound<C: Comparator<R::Key>>(&self, key: &R::Key, cmp: &C) -> usize {
        self.entries
            .partition_point(|e| cmp.compare(e.key(), key) == Ordering::Less)
    }

    /// First entry comparing equal to `key`.
    pub(crate) fn position<C: Comparator<R::Key>>(&self, key: &R::Key, cmp: &C) -> Option<usize> {
        let idx = self.lower_bound(key, cmp);
        match self.entries.get(idx) {
            Some(e) if cmp.compare(e.key(), key) == Ordering::Equal => Some(idx),
            _ => None,
        }
    }
}

// =============================================================================
// Internal
// =============================================================================

/// Separator keys and child handles; `children.len() == keys.len() + 1`.
pub(crate) struct Internal<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) children: Vec<NodeId>,
}

impl<K> Internal<K> {
    /// Empty internal node with room for one separator of transient overflow.
    pub(crate) fn try_new(max_keys: usize) -> Result<Self> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(max_keys + 1)?;
        let mut children = Vec::new();
        children.try_reserve_exact(max_keys + 2)?;
        Ok(Self { keys, children })
    }

    /// Child to descend into for `key`: the number of separators `<= key`.
    #[inline]
    pub(crate) fn upper_child<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        self.keys
            .partition_point(|sep| cmp.compare(key, sep) != Ordering::Less)
    }

    /// Child holding the first entry `>= key`: the number of separators `< key`.
    #[inline]
    pub(crate) fn lower_child<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        self.keys
            .partition_point(|sep| cmp.compare(sep, key) == Ordering::Less)
    }

    /// Install `sep` and its right-hand child next to the child at `child_idx`.
    pub(crate) fn insert_split(&mut self, child_idx: usize, sep: K, right: NodeId) {
        debug_assert!(self.keys.len() < self.keys.capacity());
        self.keys.insert(child_idx, sep);
        self.children.insert(child_idx + 1, right);
    }
}

// =============================================================================
// Node + arena
// =============================================================================

pub(crate) enum Node<'r, R: Keyed> {
    Internal(Internal<R::Key>),
    Leaf(Leaf<'r, R>),
}

/// Owns every node of one tree.
pub(crate) struct NodeArena<'r, R: Keyed> {
    nodes: Vec<Node<'r, R>>,
    limit: Option<usize>,
}

impl<'r, R: Keyed> NodeArena<'r, R> {
    pub(crate) fn new(limit: Option<usize>, initial: usize) -> Self {
        let initial = limit.map_or(initial, |l| initial.min(l));
        Self {
            nodes: Vec::with_capacity(initial),
            limit,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn capacity_bytes(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node<'r, R>>()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Node<'r, R>> {
        self.nodes.iter()
    }

    /// Make room for `additional` nodes so the next `additional` pushes cannot fail.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.nodes.len() + additional > limit {
                return Err(AllocationError::NodeLimit { limit });
            }
        }
        self.nodes.try_reserve(additional)?;
        Ok(())
    }

    /// Store a node. Must be preceded by a successful [`reserve`](Self::reserve).
    pub(crate) fn push(&mut self, node: Node<'r, R>) -> NodeId {
        debug_assert!(self.nodes.len() < self.nodes.capacity());
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<'r, R> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn leaf(&self, id: NodeId) -> &Leaf<'r, R> {
        match &self.nodes[id.index()] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("node {id} is not a leaf"),
        }
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut Leaf<'r, R> {
        match &mut self.nodes[id.index()] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("node {id} is not a leaf"),
        }
    }

    #[inline]
    pub(crate) fn internal(&self, id: NodeId) -> &Internal<R::Key> {
        match &self.nodes[id.index()] {
            Node::Internal(node) => node,
            Node::Leaf(_) => unreachable!("node {id} is not internal"),
        }
    }

    #[inline]
    pub(crate) fn internal_mut(&mut self, id: NodeId) -> &mut Internal<R::Key> {
        match &mut self.nodes[id.index()] {
            Node::Internal(node) => node,
            Node::Leaf(_) => unreachable!("node {id} is not internal"),
        }
    }
}
