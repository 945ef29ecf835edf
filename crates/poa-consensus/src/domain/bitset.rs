//! Fixed-width bitset over committee indices.

use serde::{Deserialize, Serialize};

/// Bitset recording which committee members contributed to an aggregated
/// finality signature. Bit `i` set means the validator at committee index
/// `i` signed. Fixed 64-bit capacity; callers validate against the actual
/// committee size at every use site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityVoteBitSet(u64);

impl FinalityVoteBitSet {
    /// Maximum representable committee index plus one.
    pub const CAPACITY: usize = 64;

    /// Empty bitset.
    pub fn new() -> Self {
        Self(0)
    }

    /// Set the bit at `index`. Out-of-capacity indices are ignored.
    pub fn set_bit(&mut self, index: usize) {
        if index < Self::CAPACITY {
            self.0 |= 1 << index;
        }
    }

    /// Whether the bit at `index` is set.
    pub fn test_bit(&self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1 << index) != 0
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Indices of all set bits, ascending.
    pub fn indices(&self) -> Vec<usize> {
        (0..Self::CAPACITY).filter(|i| self.test_bit(*i)).collect()
    }
}

impl From<u64> for FinalityVoteBitSet {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<FinalityVoteBitSet> for u64 {
    fn from(bitset: FinalityVoteBitSet) -> Self {
        bitset.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_test() {
        let mut bitset = FinalityVoteBitSet::new();
        bitset.set_bit(0);
        bitset.set_bit(5);
        bitset.set_bit(63);
        assert!(bitset.test_bit(0));
        assert!(bitset.test_bit(5));
        assert!(bitset.test_bit(63));
        assert!(!bitset.test_bit(1));
        assert_eq!(bitset.count(), 3);
        assert_eq!(bitset.indices(), vec![0, 5, 63]);
    }

    #[test]
    fn test_out_of_capacity_ignored() {
        let mut bitset = FinalityVoteBitSet::new();
        bitset.set_bit(64);
        assert_eq!(bitset.count(), 0);
        assert!(!bitset.test_bit(64));
    }

    #[test]
    fn test_raw_conversion() {
        let mut bitset = FinalityVoteBitSet::new();
        bitset.set_bit(0);
        bitset.set_bit(2);
        assert_eq!(u64::from(bitset), 0b101);
        assert_eq!(FinalityVoteBitSet::from(0b101), bitset);
    }
}
