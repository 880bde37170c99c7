//! Bucket layout for the dense table's robin-hood index.
//!
//! A bucket packs the probe distance into the upper 24 bits of
//! `dist_and_fingerprint` and an 8-bit hash fingerprint into the lower
//! byte. Distances start at `DIST_INC` so an all-zero bucket means empty.

use core::fmt::Debug;

/// Distance step; the low byte is reserved for the fingerprint.
pub const DIST_INC: u32 = 1 << 8;
pub const FINGERPRINT_MASK: u32 = DIST_INC - 1;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Integer type used to address the dense value array from a bucket.
///
/// The width bounds the number of buckets, and therefore the number of
/// elements, a table can hold.
pub trait BucketIndex: sealed::Sealed + Copy + Default + Eq + Debug {
    /// Largest number of buckets (and values) addressable by this width.
    const MAX_BUCKETS: usize;

    fn from_usize(i: usize) -> Self;
    fn to_usize(self) -> usize;
}

const fn max_buckets_for(bits: u32) -> usize {
    if bits >= usize::BITS {
        1 << (usize::BITS - 1)
    } else {
        1 << bits
    }
}

macro_rules! impl_bucket_index {
    ($($t:ty),*) => {$(
        impl BucketIndex for $t {
            const MAX_BUCKETS: usize = max_buckets_for(<$t>::BITS);

            #[inline]
            fn from_usize(i: usize) -> Self {
                debug_assert!(i < Self::MAX_BUCKETS);
                i as $t
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    )*};
}

impl_bucket_index!(u8, u16, u32, u64);

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub(crate) struct Bucket<I> {
    pub dist_and_fingerprint: u32,
    pub value_idx: I,
}

impl<I: BucketIndex> Bucket<I> {
    #[inline]
    pub fn new(dist_and_fingerprint: u32, value_idx: usize) -> Self {
        Self {
            dist_and_fingerprint,
            value_idx: I::from_usize(value_idx),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dist_and_fingerprint == 0
    }

    #[inline]
    pub fn value_idx(&self) -> usize {
        self.value_idx.to_usize()
    }

    /// Probe distance, 1-based (a bucket sitting in its home slot has 1).
    #[inline]
    pub fn distance(&self) -> u32 {
        self.dist_and_fingerprint >> 8
    }
}

#[inline]
pub(crate) const fn dist_inc(x: u32) -> u32 {
    x + DIST_INC
}

#[inline]
pub(crate) const fn dist_dec(x: u32) -> u32 {
    x - DIST_INC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_buckets_per_width() {
        assert_eq!(u8::MAX_BUCKETS, 256);
        assert_eq!(u16::MAX_BUCKETS, 1 << 16);
        #[cfg(target_pointer_width = "64")]
        {
            assert_eq!(u32::MAX_BUCKETS, 1 << 32);
            assert_eq!(u64::MAX_BUCKETS, 1 << 63);
        }
    }

    /// Invariant: the default bucket is empty and distance 1 is `DIST_INC`.
    #[test]
    fn empty_and_distance() {
        let b: Bucket<u32> = Bucket::default();
        assert!(b.is_empty());
        let placed: Bucket<u32> = Bucket::new(dist_inc(DIST_INC) | 0x7f, 3);
        assert!(!placed.is_empty());
        assert_eq!(placed.distance(), 2);
        assert_eq!(placed.dist_and_fingerprint & FINGERPRINT_MASK, 0x7f);
        assert_eq!(placed.value_idx(), 3);
        assert_eq!(dist_dec(placed.dist_and_fingerprint) >> 8, 1);
    }
}
