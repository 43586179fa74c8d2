//! The B+ tree: descent, point search, insert and leaf-chain walks.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::config::TreeConfig;
use crate::error::Result;
use crate::iter::{Iter, LeafRef, Leaves, Range};
use crate::node::{Leaf, Node, NodeArena, NodeId};
use crate::record::{Comparator, Keyed, NaturalOrder};

/// Fanout used when none is given.
pub const DEFAULT_ORDER: usize = 8;

/// Nodes visited on the way down to a leaf.
pub(crate) struct Descent {
    /// Each internal node with the index of the child that was followed.
    pub(crate) internals: SmallVec<[(NodeId, usize); 16]>,
    pub(crate) leaf: NodeId,
}

impl Descent {
    #[inline]
    pub(crate) fn root(&self) -> NodeId {
        self.internals.first().map_or(self.leaf, |&(id, _)| id)
    }
}

/// An in-memory B+ tree over borrowed records.
///
/// - `R`: record type; the tree stores `&'r R` and never owns records
/// - `C`: key comparator
/// - `ORDER`: maximum children per internal node (`>= 3`); leaves hold at
///   most `ORDER - 1` records
///
/// Duplicate keys are allowed and keep their insertion order. Ordered walks
/// follow a doubly-linked chain of leaves instead of re-descending.
///
/// ```rust
/// use bplus_rs::BPlusTree;
///
/// let records = [(3, "c"), (1, "a"), (2, "b")];
/// let mut tree: BPlusTree<'_, (i32, &str)> = BPlusTree::new();
/// for r in &records {
///     tree.insert(r).unwrap();
/// }
///
/// assert_eq!(tree.search(&2), Some(&(2, "b")));
/// assert_eq!(tree.search(&4), None);
///
/// let mut keys = Vec::new();
/// tree.iterate(|r| keys.push(r.0));
/// assert_eq!(keys, vec![1, 2, 3]);
/// ```
pub struct BPlusTree<'r, R: Keyed, C = NaturalOrder, const ORDER: usize = DEFAULT_ORDER> {
    pub(crate) nodes: NodeArena<'r, R>,
    pub(crate) root: Option<NodeId>,
    /// Leaf chain ends; `None` on both sides terminates the chain.
    pub(crate) head: Option<NodeId>,
    pub(crate) tail: Option<NodeId>,
    pub(crate) count: usize,
    pub(crate) leaves: usize,
    pub(crate) height: usize,
    pub(crate) cmp: C,
    config: TreeConfig,
}

impl<'r, R: Keyed, C, const ORDER: usize> BPlusTree<'r, R, C, ORDER> {
    /// Maximum children per internal node.
    pub const FANOUT: usize = ORDER;
    /// Maximum records per leaf and separators per internal node.
    pub const MAX_KEYS: usize = ORDER - 1;

    const VALID_ORDER: () = assert!(ORDER >= 3, "B+ tree ORDER must be at least 3");

    /// Empty tree ordered by `cmp`.
    pub fn with_options(cmp: C, config: TreeConfig) -> Self {
        let () = Self::VALID_ORDER;
        Self {
            nodes: NodeArena::new(config.max_nodes, config.initial_nodes),
            root: None,
            head: None,
            tail: None,
            count: 0,
            leaves: 0,
            height: 0,
            cmp,
            config,
        }
    }

    /// Empty tree ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_options(cmp, TreeConfig::default())
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Levels from root to leaves; `0` for an empty tree, `1` while the root is a leaf.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Nodes allocated so far (leaves and internal nodes).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Approximate heap bytes held by the node store.
    pub fn memory_usage(&self) -> usize {
        let buffers: usize = self
            .nodes
            .iter()
            .map(|node| match node {
                Node::Leaf(leaf) => leaf.entries.capacity() * std::mem::size_of::<&R>(),
                Node::Internal(node) => {
                    node.keys.capacity() * std::mem::size_of::<R::Key>()
                        + node.children.capacity() * std::mem::size_of::<NodeId>()
                }
            })
            .sum();
        self.nodes.capacity_bytes() + buffers
    }

    /// Call `visit` on every record in ascending key order.
    ///
    /// Walks the leaf chain from its head; the root is never consulted.
    pub fn iterate<F>(&self, mut visit: F)
    where
        F: FnMut(&'r R),
    {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let leaf = self.nodes.leaf(id);
            for &record in &leaf.entries {
                visit(record);
            }
            cursor = leaf.next;
        }
    }

    /// Records in ascending key order; iterate from the back for descending order.
    pub fn iter(&self) -> Iter<'_, 'r, R> {
        Iter::new(&self.nodes, self.head, self.tail, self.count)
    }

    /// Leaves in chain order.
    pub fn leaves(&self) -> Leaves<'_, 'r, R> {
        Leaves::new(&self.nodes, self.head)
    }

    /// Record with the smallest key (earliest inserted among ties).
    pub fn first(&self) -> Option<&'r R> {
        self.head.and_then(|id| self.nodes.leaf(id).entries.first().copied())
    }

    /// Record with the largest key (latest inserted among ties).
    pub fn last(&self) -> Option<&'r R> {
        self.tail.and_then(|id| self.nodes.leaf(id).entries.last().copied())
    }

    fn create_root_leaf(&mut self) -> Result<NodeId> {
        self.nodes.reserve(1)?;
        let leaf = Leaf::try_new(Self::MAX_KEYS)?;
        let id = self.nodes.push(Node::Leaf(leaf));
        self.root = Some(id);
        self.head = Some(id);
        self.tail = Some(id);
        self.leaves = 1;
        self.height = 1;
        debug_log!(root = %id, "created root leaf");
        Ok(id)
    }
}

impl<'r, R: Keyed, C: Default, const ORDER: usize> BPlusTree<'r, R, C, ORDER> {
    /// Empty tree with the default comparator.
    pub fn new() -> Self {
        Self::with_options(C::default(), TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::with_options(C::default(), config)
    }
}

impl<'r, R: Keyed, C: Default, const ORDER: usize> Default for BPlusTree<'r, R, C, ORDER> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, R, C, const ORDER: usize> BPlusTree<'r, R, C, ORDER>
where
    R: Keyed,
    C: Comparator<R::Key>,
{
    /// Walk from `root` to the leaf that owns `key`, recording the path.
    ///
    /// At each internal node the followed child is the number of separators
    /// `<= key`, so a key equal to a separator goes right.
    pub(crate) fn descend(&self, root: NodeId, key: &R::Key) -> Descent {
        let mut internals = SmallVec::new();
        let mut id = root;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(_) => return Descent { internals, leaf: id },
                Node::Internal(node) => {
                    let idx = node.upper_child(key, &self.cmp);
                    internals.push((id, idx));
                    id = node.children[idx];
                }
            }
        }
    }

    fn leaf_id_for(&self, key: &R::Key) -> Option<NodeId> {
        let mut id = self.root?;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(_) => return Some(id),
                Node::Internal(node) => id = node.children[node.upper_child(key, &self.cmp)],
            }
        }
    }

    /// Leaf holding the first record with key `>= key`, or the leaf just
    /// before that position.
    fn lower_leaf_id(&self, key: &R::Key) -> Option<NodeId> {
        let mut id = self.root?;
        loop {
            match self.nodes.get(id) {
                Node::Leaf(_) => return Some(id),
                Node::Internal(node) => id = node.children[node.lower_child(key, &self.cmp)],
            }
        }
    }

    /// The leaf a lookup or insert of `key` lands in; `None` for an empty tree.
    pub fn find_leaf(&self, key: &R::Key) -> Option<LeafRef<'_, 'r, R>> {
        self.leaf_id_for(key).map(|id| LeafRef::new(&self.nodes, id))
    }

    /// Earliest-inserted record whose key compares equal to `key`.
    pub fn search(&self, key: &R::Key) -> Option<&'r R> {
        let mut leaf = self.nodes.leaf(self.leaf_id_for(key)?);
        let mut pos = leaf.position(key, &self.cmp)?;

        // A leaf split inside a run of equal keys leaves the older ones to the left.
        while pos == 0 {
            let Some(prev) = leaf.prev.map(|id| self.nodes.leaf(id)) else {
                break;
            };
            match prev.entries.last() {
                Some(last) if self.cmp.compare(last.key(), key) == Ordering::Equal => {
                    pos = prev.lower_bound(key, &self.cmp);
                    leaf = prev;
                }
                _ => break,
            }
        }

        Some(leaf.entries[pos])
    }

    pub fn contains_key(&self, key: &R::Key) -> bool {
        self.search(key).is_some()
    }

    /// Records with key `>= key` in ascending order.
    pub fn iter_from(&self, key: &R::Key) -> Range<'_, 'r, R> {
        match self.lower_leaf_id(key) {
            Some(id) => {
                let pos = self.nodes.leaf(id).lower_bound(key, &self.cmp);
                Range::new(&self.nodes, Some((id, pos)))
            }
            None => Range::new(&self.nodes, None),
        }
    }

    /// Insert a record. Equal keys are kept, after the ones already present.
    ///
    /// Fails only when a node cannot be allocated, in which case the tree is
    /// left unchanged.
    pub fn insert(&mut self, record: &'r R) -> Result<()> {
        let key = record.key();
        let mut root = match self.root {
            Some(root) => root,
            None => self.create_root_leaf()?,
        };

        let path = self.descend(root, key);
        if self.nodes.leaf(path.leaf).len() >= Self::MAX_KEYS {
            let spare = match self.reserve_split(&path) {
                Ok(spare) => spare,
                Err(err) => {
                    warn_log!(error = %err, len = self.count, "insert aborted");
                    return Err(err);
                }
            };
            root = self.split_leaf(&path, spare);
        }

        // The split may have moved the key's destination to the new sibling.
        let target = self.descend(root, key).leaf;
        let Self { nodes, cmp, .. } = self;
        nodes.leaf_mut(target).insert_sorted(record, cmp);
        self.count += 1;
        Ok(())
    }

    /// Insert every record in order, stopping at the first failure.
    ///
    /// Returns how many records were inserted.
    pub fn insert_all<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'r R>,
    {
        let mut inserted = 0;
        for record in records {
            self.insert(record)?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

impl<'r, R, C, const ORDER: usize> std::fmt::Debug for BPlusTree<'r, R, C, ORDER>
where
    R: Keyed + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
