//! assoc-engine: the two storage engines behind a family of associative
//! containers, plus thin map/set adaptors over each.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep each engine self-contained with a small, checkable set of
//!   structural invariants; the adaptors only translate container-level
//!   calls.
//! - Engines:
//!   - DenseTable<K, V, S, I>: open-addressing robin-hood hash table. A
//!     dense `Vec<(K, V)>` holds the entries; a separate power-of-two
//!     bucket array maps hashes to dense indices.
//!   - RbTree<K, V, C, UNIQUE>: red-black tree whose nodes live in a
//!     `SlotMap` arena and link via generational `NodeId`s.
//! - Adaptors: DenseMap / DenseSet over DenseTable; TreeMap, TreeMultiMap,
//!   TreeSet, TreeMultiSet over RbTree.
//!
//! Dense table layout
//! - Bucket = `{ dist_and_fingerprint: u32, value_idx: I }`. The upper 24
//!   bits hold the probe distance (1 = home bucket), the low byte holds a
//!   hash fingerprint. All-zero means empty.
//! - Bucket count is `2^(64 - shifts)`; the home bucket is `hash >> shifts`.
//! - Lookup compares the packed word first and the key only on a match; it
//!   stops as soon as a bucket is "richer" than the probe.
//! - Insert appends to the dense array first, then links the bucket
//!   (robin-hood displacement). Growth halves `shifts` and replays every
//!   entry into fresh buckets. When the index width `I` is exhausted the
//!   appended entry is popped and `Error::BucketOverflow` is returned.
//! - Erase shifts the following chain back by one (no tombstones), then
//!   swap-removes the entry and repoints the bucket of the moved one.
//!
//! Tree layout
//! - `Option<NodeId>` links; `None` is a black nil leaf.
//! - Cached leftmost/rightmost stand in for sentinel nodes; `None` is the
//!   end position, and stepping back from it lands on the last node.
//! - Unique trees reject equal keys. Multi trees insert after existing
//!   equal keys and `find` returns the leftmost match.
//! - Erase of a node with two children splices the in-order successor
//!   into its place, so ids of other nodes never change.
//!
//! Errors and logging
//! - Runtime failures are typed (`Error`); structural checks report
//!   `InvariantViolation`. Container methods that may overflow come in a
//!   panicking and a `try_` flavor.
//! - Growth and overflow are logged at `debug`, bulk rebuilds at `trace`,
//!   through the `log` facade. No logger is installed here.
//!
//! Notes and non-goals
//! - Single-threaded value types; no internal synchronization.
//! - No serialization and no custom allocators. Node handles move between
//!   trees by value, so no allocator check is needed.

mod bucket;
pub mod compare;
mod config;
pub mod dense_map;
pub mod dense_set;
pub mod dense_table;
mod dense_table_proptest;
mod error;
mod hashing;
pub mod rb_tree;
mod rb_tree_proptest;
pub mod tree_map;
pub mod tree_set;

// Public surface
pub use bucket::BucketIndex;
pub use compare::{Compare, Natural, Reversed};
pub use config::{TableConfig, DEFAULT_MAX_LOAD_FACTOR};
pub use dense_map::DenseMap;
pub use dense_set::DenseSet;
pub use dense_table::DenseTable;
pub use error::{Error, InvariantViolation, Result};
pub use hashing::mix;
pub use rb_tree::{Cursor, InsertReturn, NodeHandle, NodeId, RbTree};
pub use tree_map::{TreeMap, TreeMultiMap};
pub use tree_set::{TreeMultiSet, TreeSet};
