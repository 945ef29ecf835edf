//! Finality vote entities.

use poa_crypto::{keccak256_concat, BlsPublicKey, BlsSignature};
use primitive_types::H256;

/// The payload a validator attests to: a specific, already-assembled block.
/// Votes always lag block production by at least one height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteData {
    /// Height of the block being attested
    pub target_number: u64,
    /// Hash of the block being attested
    pub target_hash: H256,
}

impl VoteData {
    /// Digest signed by each voter: Keccak-256 over the big-endian target
    /// number followed by the target hash.
    pub fn hash(&self) -> H256 {
        H256(keccak256_concat(&[
            &self.target_number.to_be_bytes(),
            self.target_hash.as_bytes(),
        ]))
    }
}

/// A single validator's finality attestation as received from the vote pool.
#[derive(Clone, Debug)]
pub struct VoteEnvelope {
    /// Voter's BLS public key
    pub public_key: BlsPublicKey,
    /// BLS signature over `data.hash()`
    pub signature: BlsSignature,
    /// The attested target
    pub data: VoteData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let vote = VoteData {
            target_number: 4,
            target_hash: H256::repeat_byte(0x1),
        };
        assert_eq!(vote.hash(), vote.hash());
    }

    #[test]
    fn test_digest_binds_number_and_hash() {
        let base = VoteData {
            target_number: 4,
            target_hash: H256::repeat_byte(0x1),
        };
        let other_number = VoteData {
            target_number: 5,
            ..base
        };
        let other_hash = VoteData {
            target_hash: H256::repeat_byte(0x2),
            ..base
        };
        assert_ne!(base.hash(), other_number.hash());
        assert_ne!(base.hash(), other_hash.hash());
    }
}
