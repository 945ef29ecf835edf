//! Header extra-data codec.
//!
//! Wire layout of the header extension region:
//!
//! ```text
//! pre-finality-hardfork:
//!   [vanity(32)] [checkpoint validators: k * 20] [seal(65)]
//! post-finality-hardfork:
//!   [vanity(32)] [flag(1)]
//!   [bitset(8 LE)] [aggregated signature(96)]      (iff flag == 1)
//!   [checkpoint validators: k * (20 + 48)] [seal(65)]
//! ```
//!
//! The checkpoint validator list is present only on epoch-boundary headers.
//! Decoding is strict: every byte-length mismatch maps to a specific error,
//! nothing is truncated or padded.

use poa_crypto::bls::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use poa_crypto::{BlsPublicKey, BlsSignature};

use super::bitset::FinalityVoteBitSet;
use super::validator::{Address, ValidatorWithBlsPub, ADDRESS_LENGTH};
use crate::error::{ConsensusError, ConsensusResult};

/// Fixed byte length of the vanity prefix.
pub const EXTRA_VANITY: usize = 32;

/// Fixed byte length of the trailing seal signature.
pub const EXTRA_SEAL: usize = 65;

/// Byte length of the voter bitset on the wire.
const BITSET_LENGTH: usize = 8;

/// An aggregated finality vote carried in a header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalityVote {
    /// Committee indices that contributed to the aggregate
    pub voted_validators: FinalityVoteBitSet,
    /// Aggregate of the voters' BLS signatures
    pub aggregated_signature: BlsSignature,
}

/// Decoded form of a header's extension bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderExtraData {
    /// Opaque proposer vanity
    pub vanity: [u8; EXTRA_VANITY],
    /// Aggregated finality vote, post-hardfork headers only
    pub finality_vote: Option<FinalityVote>,
    /// Full committee, present only on epoch checkpoint headers
    pub checkpoint_validators: Vec<ValidatorWithBlsPub>,
    /// Opaque seal signature of the proposer
    pub seal: [u8; EXTRA_SEAL],
}

impl Default for HeaderExtraData {
    fn default() -> Self {
        Self {
            vanity: [0u8; EXTRA_VANITY],
            finality_vote: None,
            checkpoint_validators: Vec::new(),
            seal: [0u8; EXTRA_SEAL],
        }
    }
}

impl HeaderExtraData {
    /// Serialize for a header at the given era. The total length is fully
    /// determined by the finality flag and the validator count.
    pub fn encode(&self, finality_era: bool) -> Vec<u8> {
        let entry_size = if finality_era {
            ADDRESS_LENGTH + PUBLIC_KEY_LENGTH
        } else {
            ADDRESS_LENGTH
        };
        let mut raw = Vec::with_capacity(
            EXTRA_VANITY
                + 1
                + BITSET_LENGTH
                + SIGNATURE_LENGTH
                + self.checkpoint_validators.len() * entry_size
                + EXTRA_SEAL,
        );

        raw.extend_from_slice(&self.vanity);
        if finality_era {
            match &self.finality_vote {
                Some(vote) => {
                    raw.push(1);
                    raw.extend_from_slice(&u64::from(vote.voted_validators).to_le_bytes());
                    raw.extend_from_slice(&vote.aggregated_signature.to_bytes());
                }
                None => raw.push(0),
            }
        }
        for validator in &self.checkpoint_validators {
            raw.extend_from_slice(validator.address.as_bytes());
            if finality_era {
                match &validator.bls_public_key {
                    Some(key) => raw.extend_from_slice(&key.to_bytes()),
                    // Committees of the finality era always carry keys; a
                    // zeroed key is rejected on decode.
                    None => raw.extend_from_slice(&[0u8; PUBLIC_KEY_LENGTH]),
                }
            }
        }
        raw.extend_from_slice(&self.seal);
        raw
    }

    /// Parse the extension region of a header at the given era.
    pub fn decode(raw: &[u8], finality_era: bool) -> ConsensusResult<Self> {
        if raw.len() < EXTRA_VANITY {
            return Err(ConsensusError::MissingVanity);
        }
        let mut vanity = [0u8; EXTRA_VANITY];
        vanity.copy_from_slice(&raw[..EXTRA_VANITY]);
        let mut rest = &raw[EXTRA_VANITY..];

        let finality_vote = if finality_era {
            let (&flag, after_flag) = rest
                .split_first()
                .ok_or(ConsensusError::MissingHasFinalityVote)?;
            rest = after_flag;
            match flag {
                0 => None,
                1 => {
                    if rest.len() < BITSET_LENGTH {
                        return Err(ConsensusError::MissingFinalityVoteBitSet);
                    }
                    let mut bitset_bytes = [0u8; BITSET_LENGTH];
                    bitset_bytes.copy_from_slice(&rest[..BITSET_LENGTH]);
                    rest = &rest[BITSET_LENGTH..];

                    if rest.len() < SIGNATURE_LENGTH {
                        return Err(ConsensusError::MissingFinalitySignature);
                    }
                    let signature = BlsSignature::from_bytes(&rest[..SIGNATURE_LENGTH])?;
                    rest = &rest[SIGNATURE_LENGTH..];

                    Some(FinalityVote {
                        voted_validators: u64::from_le_bytes(bitset_bytes).into(),
                        aggregated_signature: signature,
                    })
                }
                invalid => return Err(ConsensusError::InvalidHasFinalityVote(invalid)),
            }
        } else {
            None
        };

        if rest.len() < EXTRA_SEAL {
            return Err(ConsensusError::MissingSignature);
        }
        let (validator_bytes, seal_bytes) = rest.split_at(rest.len() - EXTRA_SEAL);
        let mut seal = [0u8; EXTRA_SEAL];
        seal.copy_from_slice(seal_bytes);

        let entry_size = if finality_era {
            ADDRESS_LENGTH + PUBLIC_KEY_LENGTH
        } else {
            ADDRESS_LENGTH
        };
        if validator_bytes.len() % entry_size != 0 {
            return Err(ConsensusError::InvalidSpanValidators);
        }
        let mut checkpoint_validators = Vec::with_capacity(validator_bytes.len() / entry_size);
        for entry in validator_bytes.chunks_exact(entry_size) {
            let address = Address::from_slice(&entry[..ADDRESS_LENGTH]);
            let bls_public_key = if finality_era {
                Some(BlsPublicKey::from_bytes(&entry[ADDRESS_LENGTH..])?)
            } else {
                None
            };
            checkpoint_validators.push(ValidatorWithBlsPub {
                address,
                bls_public_key,
            });
        }

        Ok(Self {
            vanity,
            finality_vote,
            checkpoint_validators,
            seal,
        })
    }
}
