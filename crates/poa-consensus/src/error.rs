//! Error types for the consensus core.
//!
//! Decode and verification failures are sentinels: block import or vote
//! ingestion rejects the artifact and nothing is retried internally.

use primitive_types::{H160, H256};
use thiserror::Error;

/// Consensus core errors.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Extra-data shorter than the vanity prefix
    #[error("Extra-data is missing the vanity prefix")]
    MissingVanity,

    /// Extra-data shorter than the trailing seal signature
    #[error("Extra-data is missing the seal signature")]
    MissingSignature,

    /// Checkpoint validator region is not a multiple of the entry size
    #[error("Invalid checkpoint validator list length")]
    InvalidSpanValidators,

    /// Post-hardfork extra-data without the finality-vote flag byte
    #[error("Extra-data is missing the finality vote flag")]
    MissingHasFinalityVote,

    /// Finality flag set but the voter bitset is absent
    #[error("Extra-data is missing the finality vote bitset")]
    MissingFinalityVoteBitSet,

    /// Finality flag set but the aggregated signature is absent
    #[error("Extra-data is missing the aggregated finality signature")]
    MissingFinalitySignature,

    /// Finality flag byte is neither 0 nor 1
    #[error("Invalid finality vote flag: {0}")]
    InvalidHasFinalityVote(u8),

    /// Fewer voters than the 2/3 quorum
    #[error("Not enough finality votes: have {have}, need {need}")]
    NotEnoughFinalityVote {
        /// Voters present in the bitset
        have: usize,
        /// Quorum threshold
        need: usize,
    },

    /// Bitset references an index outside the committee
    #[error("Finality vote bitset references an invalid validator index")]
    InvalidFinalityVotedBitSet,

    /// Aggregated signature does not match the signer set implied by the bitset
    #[error("Finality signature verification failed")]
    FinalitySignatureVerificationFailed,

    /// Vote target number disagrees with the target block
    #[error("Invalid vote target number: expected {expected}, got {actual}")]
    InvalidTargetNumber {
        /// Number of the block the target hash resolves to
        expected: u64,
        /// Number claimed by the vote
        actual: u64,
    },

    /// Vote signed by a key outside the current committee
    #[error("Finality vote from unauthorized validator")]
    UnauthorizedFinalityVoter,

    /// Header timestamp violates the timing bounds
    #[error("Block timestamp outside the allowed window")]
    FutureBlock,

    /// No snapshot resolvable for the requested block
    #[error("Snapshot not found for block {0:?}")]
    SnapshotNotFound(H256),

    /// Header lookup failed while walking an ancestor chain
    #[error("Unknown block {0:?}")]
    UnknownBlock(H256),

    /// Snapshot advancement over a broken header chain
    #[error("Headers are not contiguous at block {number}")]
    NonContiguousHeaders {
        /// Number of the offending header
        number: u64,
    },

    /// Registry query for an address outside the validator set
    #[error("Address {0:?} is not a validator")]
    NotAValidator(H160),

    /// Registry has no BLS public key recorded for a validator
    #[error("No BLS public key found for validator {0:?}")]
    MissingBlsPublicKey(H160),

    /// Snapshot persistence failure
    #[error("Storage error: {reason}")]
    Storage {
        /// Description from the underlying store
        reason: String,
    },

    /// Malformed cryptographic material
    #[error(transparent)]
    Crypto(#[from] poa_crypto::CryptoError),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
