//! # bplus-rs
//!
//! An embeddable in-memory B+ tree over borrowed records.
//!
//! The tree indexes `&'r R` where `R` exposes one key through [`Keyed`].
//! Keys are ordered by a [`Comparator`] chosen per tree and the fanout is a
//! const generic. Inner nodes route lookups; leaves are threaded into a
//! doubly-linked chain, so ordered walks never go back through the root.
//!
//! ## Example
//!
//! ```rust
//! use bplus_rs::{BPlusTree, Keyed, NaturalOrder};
//!
//! struct Account {
//!     id: u64,
//!     balance: i64,
//! }
//!
//! impl Keyed for Account {
//!     type Key = u64;
//!     fn key(&self) -> &u64 {
//!         &self.id
//!     }
//! }
//!
//! let accounts: Vec<Account> = (0..100)
//!     .map(|id| Account { id: 99 - id, balance: id as i64 * 10 })
//!     .collect();
//!
//! // Fanout 4: at most 3 records per leaf.
//! let mut tree: BPlusTree<'_, Account, NaturalOrder, 4> = BPlusTree::new();
//! for account in &accounts {
//!     tree.insert(account)?;
//! }
//!
//! assert_eq!(tree.search(&42).map(|a| a.balance), Some(570));
//! assert!(tree.iter().map(|a| a.id).eq(0..100u64));
//! # Ok::<(), bplus_rs::AllocationError>(())
//! ```
//!
//! ## Design
//!
//! - Nodes live in an arena and refer to each other by index.
//! - Inserts split full leaves before inserting, then push separators up the
//!   recorded path; a full root grows the tree by one level.
//! - Every node an insert needs is allocated before anything is modified, so
//!   a failed insert leaves the tree untouched.
//! - Equal keys are kept in insertion order; [`BPlusTree::search`] returns
//!   the oldest.
//! - There is no removal.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

#[macro_use]
mod trace;

mod config;
mod error;
mod iter;
mod node;
mod record;
mod split;
mod sync;
mod tree;

pub use config::TreeConfig;
pub use error::{AllocationError, Result};
pub use iter::{Iter, LeafRef, Leaves, Range};
pub use record::{ByFn, Comparator, Keyed, NaturalOrder};
pub use sync::SharedTree;
pub use tree::{BPlusTree, DEFAULT_ORDER};

#[cfg(test)]
mod proptests;
