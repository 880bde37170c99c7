//! Hash post-processing shared by the dense table.

use crate::bucket::{DIST_INC, FINGERPRINT_MASK};

const MIX_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Folded 64x64→128 multiply. Spreads entropy from the low bits of weak
/// hashes (identity hashes of integers, for instance) into the high bits
/// that select the home bucket.
#[inline]
pub fn mix(h: u64) -> u64 {
    let r = u128::from(h) * u128::from(MIX_MULTIPLIER);
    (r as u64) ^ ((r >> 64) as u64)
}

/// Distance 1 combined with the low byte of the hash.
#[inline]
pub(crate) fn dist_and_fingerprint_from_hash(hash: u64) -> u32 {
    DIST_INC | (hash as u32 & FINGERPRINT_MASK)
}

/// Home bucket: the top `64 - shifts` bits of the hash.
#[inline]
pub(crate) fn bucket_idx_from_hash(hash: u64, shifts: u8) -> usize {
    (hash >> shifts) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_moves_low_bits_up() {
        let a = mix(1) >> 60;
        let b = mix(2) >> 60;
        let c = mix(3) >> 60;
        assert!(a != b || b != c, "sequential keys should not share a top nibble");
        assert_eq!(mix(0), 0);
    }

    #[test]
    fn home_bucket_uses_top_bits() {
        let hash = 0xC000_0000_0000_00ABu64;
        assert_eq!(bucket_idx_from_hash(hash, 62), 3);
        assert_eq!(dist_and_fingerprint_from_hash(hash), DIST_INC | 0xAB);
    }
}
