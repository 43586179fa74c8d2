//! Errors raised by tree mutation.

use std::collections::TryReserveError;

/// Node allocation failed during an insert.
///
/// The insert that returns this error leaves the tree exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    /// The arena would grow past the configured `TreeConfig::max_nodes`.
    NodeLimit {
        /// Configured node budget.
        limit: usize,
    },
    /// The global allocator refused to reserve node storage.
    OutOfMemory,
}

impl From<TryReserveError> for AllocationError {
    fn from(_: TryReserveError) -> Self {
        AllocationError::OutOfMemory
    }
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::NodeLimit { limit } => {
                write!(f, "node limit of {} reached", limit)
            }
            AllocationError::OutOfMemory => write!(f, "out of memory allocating tree node"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// Result type for tree mutation.
pub type Result<T> = std::result::Result<T, AllocationError>;
