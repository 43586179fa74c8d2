//! Runtime tree configuration.
//!
//! Fanout is a const generic on [`BPlusTree`](crate::BPlusTree); everything
//! here only affects how the node arena allocates.

/// Configuration for a [`BPlusTree`](crate::BPlusTree).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Upper bound on the number of nodes the tree may allocate.
    ///
    /// An insert that would exceed it fails with
    /// [`AllocationError::NodeLimit`](crate::AllocationError::NodeLimit).
    pub max_nodes: Option<usize>,
    /// Node slots reserved when the tree is created.
    pub initial_nodes: usize,
}

impl TreeConfig {
    /// Default configuration: unbounded, nothing reserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of nodes.
    pub fn max_nodes(mut self, limit: usize) -> Self {
        self.max_nodes = Some(limit);
        self
    }

    /// Reserve room for `n` nodes up front.
    pub fn initial_nodes(mut self, n: usize) -> Self {
        self.initial_nodes = n;
        self
    }
}
