//! Construction-time tuning for [`DenseTable`](crate::dense_table::DenseTable).

use crate::error::{Error, Result};

pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.8;

/// Settings applied when a dense table is created.
///
/// ```
/// use assoc_engine::TableConfig;
///
/// let cfg = TableConfig::new().bucket_count(64).max_load_factor(0.5);
/// assert_eq!(cfg.bucket_count, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Number of elements to reserve room for. Zero defers all bucket
    /// allocation to the first insertion.
    pub bucket_count: usize,
    /// Fraction of buckets that may be occupied before the table grows.
    pub max_load_factor: f32,
    /// Marks the hasher as already producing well-distributed 64-bit
    /// output, which skips the extra `mix` step.
    pub avalanching: bool,
}

impl TableConfig {
    pub const fn new() -> Self {
        Self {
            bucket_count: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            avalanching: false,
        }
    }

    pub const fn bucket_count(mut self, n: usize) -> Self {
        self.bucket_count = n;
        self
    }

    pub const fn max_load_factor(mut self, ml: f32) -> Self {
        self.max_load_factor = ml;
        self
    }

    pub const fn avalanching(mut self, yes: bool) -> Self {
        self.avalanching = yes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_load_factor(self.max_load_factor)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_load_factor(ml: f32) -> Result<()> {
    if ml > 0.0 && ml <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidLoadFactor(ml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the default config is lazy, uses 0.8 and mixes hashes.
    #[test]
    fn defaults() {
        let cfg = TableConfig::default();
        assert_eq!(cfg.bucket_count, 0);
        assert_eq!(cfg.max_load_factor, DEFAULT_MAX_LOAD_FACTOR);
        assert!(!cfg.avalanching);
        assert!(cfg.validate().is_ok());
    }

    /// Invariant: load factors outside (0, 1] are rejected, NaN included.
    #[test]
    fn load_factor_bounds() {
        for bad in [0.0, -0.5, 1.01, f32::NAN] {
            let cfg = TableConfig::new().max_load_factor(bad);
            assert!(matches!(cfg.validate(), Err(Error::InvalidLoadFactor(_))));
        }
        assert!(TableConfig::new().max_load_factor(1.0).validate().is_ok());
        assert!(TableConfig::new().max_load_factor(0.01).validate().is_ok());
    }
}
