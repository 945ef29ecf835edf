//! Driven ports: collaborators the consensus core calls out to.
//!
//! All traits are synchronous. The core is CPU-bound (hashing, pairing
//! checks) and callers that live on an async runtime wrap it in their own
//! blocking executor.

use primitive_types::H256;

use crate::domain::{Address, Header, VoteEnvelope};
use crate::error::ConsensusResult;
use poa_crypto::BlsPublicKey;

/// Read and invoke the on-chain validator registry.
///
/// The registry is the sole source of committee membership. Errors are
/// surfaced as-is; the core never falls back to a stale committee.
pub trait ValidatorContract: Send + Sync {
    /// Validator addresses eligible at `block_number`, in registry order.
    fn get_validators(&self, block_number: u64) -> ConsensusResult<Vec<Address>>;

    /// BLS public key registered by `address` as of `block_number`.
    fn get_bls_public_key(&self, block_number: u64, address: Address)
        -> ConsensusResult<BlsPublicKey>;

    /// Settle the closing epoch: rotate the committee and distribute
    /// accumulated rewards. Invoked while finalizing a checkpoint block.
    fn wrap_up_epoch(&self, block_number: u64) -> ConsensusResult<()>;

    /// Credit the block reward for `block_number` to its sealer.
    fn submit_block_reward(&self, block_number: u64) -> ConsensusResult<()>;

    /// Report a validator that failed its sealing slot.
    fn slash(&self, block_number: u64, spoiled_validator: Address) -> ConsensusResult<()>;

    /// Distribute the finality reward among validators whose votes were
    /// included in the block at `block_number`.
    fn finality_reward(
        &self,
        block_number: u64,
        voted_validators: &[Address],
    ) -> ConsensusResult<()>;
}

/// Pool of finality votes gossiped by committee members.
pub trait VotePool: Send + Sync {
    /// All known votes targeting the block with `target_hash`. May contain
    /// duplicates, stale targets and votes from non-members; the caller
    /// filters.
    fn fetch_vote_by_block_hash(&self, target_hash: H256) -> Vec<VoteEnvelope>;
}

/// Read access to the canonical header chain.
pub trait HeaderReader: Send + Sync {
    /// The header with the given hash, if known.
    fn header_by_hash(&self, hash: H256) -> Option<Header>;
}

/// Durable key-value storage for consensus state that must survive restarts.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &[u8]) -> ConsensusResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> ConsensusResult<()>;
}
