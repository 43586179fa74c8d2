//! Leaf split, internal split and upward propagation.
//!
//! A split runs in two phases. [`BPlusTree::reserve_split`] works out from
//! the descent path how many nodes the split will create (sibling leaf, one
//! sibling per full ancestor, maybe a new root) and allocates all of them.
//! Only then does [`BPlusTree::split_leaf`] move entries and rewire links,
//! which cannot fail. An allocation error therefore leaves the tree as it
//! was.

use crate::error::Result;
use crate::node::{Internal, Leaf, Node, NodeId};
use crate::record::{Comparator, Keyed};
use crate::tree::{BPlusTree, Descent};

/// Nodes pre-allocated for one insert.
pub(crate) struct Spare<'r, R: Keyed> {
    leaf: Leaf<'r, R>,
    /// Consumed from the back: ancestor siblings bottom-up, then the new root.
    internals: Vec<Internal<R::Key>>,
}

impl<'r, R, C, const ORDER: usize> BPlusTree<'r, R, C, ORDER>
where
    R: Keyed,
    C: Comparator<R::Key>,
{
    /// Allocate every node splitting `path.leaf` will need.
    pub(crate) fn reserve_split(&mut self, path: &Descent) -> Result<Spare<'r, R>> {
        let mut needed = 0;
        let mut grows_root = true;
        for &(id, _) in path.internals.iter().rev() {
            if self.nodes.internal(id).keys.len() < Self::MAX_KEYS {
                grows_root = false;
                break;
            }
            needed += 1;
        }
        if grows_root {
            needed += 1;
        }

        self.nodes.reserve(1 + needed)?;
        let leaf = Leaf::try_new(Self::MAX_KEYS)?;
        let mut internals = Vec::new();
        internals.try_reserve_exact(needed)?;
        for _ in 0..needed {
            internals.push(Internal::try_new(Self::MAX_KEYS)?);
        }
        Ok(Spare { leaf, internals })
    }

    /// Split the full leaf at the bottom of `path` and propagate upward.
    ///
    /// Entries from `ORDER / 2` on move to a new right sibling, which is
    /// spliced into the chain after the old leaf. Its first key is copied up
    /// as the separator. Returns the root after propagation.
    pub(crate) fn split_leaf(&mut self, path: &Descent, spare: Spare<'r, R>) -> NodeId {
        let Spare {
            leaf: mut right,
            internals,
        } = spare;
        let left_id = path.leaf;
        let mid = ORDER / 2;

        let left = self.nodes.leaf_mut(left_id);
        debug_assert_eq!(left.len(), Self::MAX_KEYS);
        right.entries.extend(left.entries.drain(mid..));
        right.prev = Some(left_id);
        right.next = left.next;

        let sep = right.entries[0].key().clone();
        let old_next = right.next;
        let right_id = self.nodes.push(Node::Leaf(right));

        self.nodes.leaf_mut(left_id).next = Some(right_id);
        match old_next {
            Some(next) => self.nodes.leaf_mut(next).prev = Some(right_id),
            None => self.tail = Some(right_id),
        }
        self.leaves += 1;
        trace_log!(left = %left_id, right = %right_id, "split leaf");

        self.propagate(path, sep, right_id, internals)
    }

    /// Push `sep`/`right` into the ancestors on `path`, splitting the ones that overflow.
    fn propagate(
        &mut self,
        path: &Descent,
        mut sep: R::Key,
        mut right: NodeId,
        mut spare: Vec<Internal<R::Key>>,
    ) -> NodeId {
        for &(parent_id, child_idx) in path.internals.iter().rev() {
            let parent = self.nodes.internal_mut(parent_id);
            parent.insert_split(child_idx, sep, right);
            if parent.keys.len() <= Self::MAX_KEYS {
                debug_assert!(spare.is_empty());
                return path.root();
            }

            // keys[mid] moves up; it stays in neither half.
            let Some(mut sibling) = spare.pop() else {
                unreachable!("split reservation too small at {parent_id}");
            };
            let mid = parent.keys.len() / 2;
            sibling.keys.extend(parent.keys.drain(mid + 1..));
            sibling.children.extend(parent.children.drain(mid + 1..));
            sep = parent.keys.remove(mid);

            right = self.nodes.push(Node::Internal(sibling));
            trace_log!(left = %parent_id, right = %right, "split internal node");
        }

        let old_root = path.root();
        let Some(mut root) = spare.pop() else {
            unreachable!("split reservation has no room for a new root");
        };
        root.keys.push(sep);
        root.children.push(old_root);
        root.children.push(right);
        let root_id = self.nodes.push(Node::Internal(root));

        self.root = Some(root_id);
        self.height += 1;
        debug_log!(root = %root_id, height = self.height, "promoted new root");
        root_id
    }
}
