//! Failure signals surfaced by the containers.

use thiserror::Error;

/// Runtime failures reported by the hash and tree containers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// `at()` was called with a key that is not present.
    #[error("key not found")]
    KeyNotFound,
    /// The bucket index type cannot address any more buckets.
    #[error("reached max bucket count ({max_buckets}), cannot increase size")]
    BucketOverflow { max_buckets: usize },
    /// A bulk `replace` was handed more values than the table can index.
    #[error("too many elements: {len} exceeds max size {max_size}")]
    TooManyElements { len: usize, max_size: usize },
    /// Load factors must lie in `(0, 1]`.
    #[error("invalid max load factor {0}, expected a value in (0, 1]")]
    InvalidLoadFactor(f32),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Structural problems found by the `check_invariants` methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("bucket count {0} is not a power of two")]
    BucketCountNotPowerOfTwo(usize),
    #[error("{len} values exceed the bucket capacity {capacity}")]
    OverCapacity { len: usize, capacity: usize },
    #[error("bucket {bucket} points at value {value_idx} but only {len} values exist")]
    DanglingBucket {
        bucket: usize,
        value_idx: usize,
        len: usize,
    },
    #[error("value {0} is referenced by more than one bucket")]
    SharedValue(usize),
    #[error("value {0} is not referenced by any bucket")]
    UnindexedValue(usize),
    #[error("bucket {0} stores a distance or fingerprint that disagrees with its key")]
    StaleFingerprint(usize),
    #[error("probe chain broken at bucket {0}")]
    ProbeOrder(usize),
    #[error("root node is red")]
    RedRoot,
    #[error("red node has a red child")]
    RedRedEdge,
    #[error("black height differs between paths ({left} vs {right})")]
    BlackHeightMismatch { left: usize, right: usize },
    #[error("child does not link back to its parent")]
    BrokenParentLink,
    #[error("in-order traversal is out of order")]
    OrderViolation,
    #[error("cached first/last node is stale")]
    StaleBounds,
    #[error("tree reaches {reachable} nodes but stores {stored}")]
    LengthMismatch { reachable: usize, stored: usize },
}
