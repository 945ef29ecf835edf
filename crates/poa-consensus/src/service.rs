//! Consensus engine service: snapshot resolution, header and finality
//! verification, vote assembly and block finalization duties.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use primitive_types::H256;
use tracing::{debug, warn};

use crate::cache::SnapshotCache;
use crate::config::ChainConfig;
use crate::domain::{
    backoff_time, Address, FinalityVote, FinalityVoteBitSet, Header, HeaderExtraData, Snapshot,
    ValidatorWithBlsPub, VoteData, VoteEnvelope,
};
use crate::error::{ConsensusError, ConsensusResult};
use crate::ports::outbound::{HeaderReader, KeyValueStore, ValidatorContract, VotePool};
use poa_crypto::BlsSignature;

/// Snapshots kept hot in memory.
pub const DEFAULT_SNAPSHOT_CACHE_SIZE: usize = 128;

/// Tolerated clock skew when judging whether a header is from the future.
const ALLOWED_CLOCK_DRIFT_SECS: u64 = 15;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// The proof-of-authority consensus engine.
///
/// Holds the chain configuration and the outbound collaborators; all
/// verification state lives in snapshots resolved on demand.
pub struct ConsensusService {
    chain_config: ChainConfig,
    contract: Arc<dyn ValidatorContract>,
    vote_pool: Option<Arc<dyn VotePool>>,
    db: Arc<dyn KeyValueStore>,
    snapshots: SnapshotCache,
}

impl ConsensusService {
    /// Engine with the default snapshot cache size. A `None` vote pool
    /// disables vote assembly, as on non-validator nodes.
    pub fn new(
        chain_config: ChainConfig,
        contract: Arc<dyn ValidatorContract>,
        vote_pool: Option<Arc<dyn VotePool>>,
        db: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::with_cache_capacity(
            chain_config,
            contract,
            vote_pool,
            db,
            DEFAULT_SNAPSHOT_CACHE_SIZE,
        )
    }

    /// Engine with an explicit snapshot cache capacity.
    pub fn with_cache_capacity(
        chain_config: ChainConfig,
        contract: Arc<dyn ValidatorContract>,
        vote_pool: Option<Arc<dyn VotePool>>,
        db: Arc<dyn KeyValueStore>,
        capacity: usize,
    ) -> Self {
        Self {
            chain_config,
            contract,
            vote_pool,
            db,
            snapshots: SnapshotCache::new(capacity),
        }
    }

    /// The configuration this engine runs under.
    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    /// Resolve the committee snapshot as of block (`number`, `hash`).
    ///
    /// Resolution order: memory cache, persistent store, then a walk back
    /// through parent headers to the nearest epoch checkpoint, which is
    /// rebuilt from the validator registry and replayed forward. The
    /// result is cached and persisted before returning.
    pub fn snapshot(
        &self,
        chain: &dyn HeaderReader,
        number: u64,
        hash: H256,
    ) -> ConsensusResult<Arc<Snapshot>> {
        let mut pending: Vec<Header> = Vec::new();
        let mut number = number;
        let mut hash = hash;

        let snap = loop {
            if let Some(snap) = self.snapshots.get(&hash) {
                break snap;
            }
            if let Some(snap) = Snapshot::load(self.db.as_ref(), hash)? {
                debug!(number, %hash, "loaded snapshot from store");
                let snap = Arc::new(snap);
                self.snapshots.insert(hash, Arc::clone(&snap));
                break snap;
            }
            if self.chain_config.is_checkpoint(number) {
                let header = chain
                    .header_by_hash(hash)
                    .ok_or(ConsensusError::SnapshotNotFound(hash))?;
                let validators = self.checkpoint_validators(&header)?;
                let snap = Arc::new(Snapshot::new(number, hash, validators));
                snap.store(self.db.as_ref())?;
                self.snapshots.insert(hash, Arc::clone(&snap));
                debug!(number, %hash, "rebuilt checkpoint snapshot from registry");
                break snap;
            }
            let header = chain
                .header_by_hash(hash)
                .ok_or(ConsensusError::SnapshotNotFound(hash))?;
            hash = header.parent_hash;
            number -= 1;
            pending.push(header);
        };

        if pending.is_empty() {
            return Ok(snap);
        }
        // Collected newest-first while walking back
        pending.reverse();
        let advanced = Arc::new(snap.apply(&pending, &self.chain_config)?);
        advanced.store(self.db.as_ref())?;
        self.snapshots.insert(advanced.hash, Arc::clone(&advanced));
        debug!(
            number = advanced.number,
            replayed = pending.len(),
            "advanced snapshot"
        );
        Ok(advanced)
    }

    /// The committee to embed in the checkpoint header at `header.number`,
    /// sorted by address. After the finality hardfork each member carries
    /// its registered BLS key; members whose key cannot be fetched are
    /// left out of the committee rather than included keyless.
    pub fn checkpoint_validators(
        &self,
        header: &Header,
    ) -> ConsensusResult<Vec<ValidatorWithBlsPub>> {
        let mut addresses = self.contract.get_validators(header.number)?;
        addresses.sort();

        if !self.chain_config.is_finality_vote(header.number) {
            return Ok(addresses.into_iter().map(ValidatorWithBlsPub::new).collect());
        }

        let mut validators = Vec::with_capacity(addresses.len());
        for address in addresses {
            match self.contract.get_bls_public_key(header.number, address) {
                Ok(key) => validators.push(ValidatorWithBlsPub::with_key(address, key)),
                Err(err) => {
                    warn!(%address, %err, "checkpoint validator has no usable finality key, dropping");
                }
            }
        }
        Ok(validators)
    }

    /// Check `header.time` against the wall clock and, once the strict
    /// timestamp hardfork is active, against the parent timestamp plus the
    /// block period and the proposer's backoff delay.
    pub fn verify_header_time(
        &self,
        header: &Header,
        parent: &Header,
        snapshot: &Snapshot,
    ) -> ConsensusResult<()> {
        if header.time > unix_now() + ALLOWED_CLOCK_DRIFT_SECS {
            return Err(ConsensusError::FutureBlock);
        }
        if self.chain_config.is_timestamp_check(header.number) {
            let min_time =
                parent.time + self.chain_config.period + backoff_time(header, snapshot, &self.chain_config);
            if header.time < min_time {
                debug!(
                    number = header.number,
                    time = header.time,
                    min_time,
                    "header sealed before its slot"
                );
                return Err(ConsensusError::FutureBlock);
            }
        }
        Ok(())
    }

    /// Verify an aggregated finality vote for the block at
    /// (`target_number`, `target_hash`).
    ///
    /// Order matters: quorum is judged on the bit count alone, then every
    /// set bit must map to a committee member with a registered key, and
    /// only then is the pairing check run.
    pub fn verify_finality_signatures(
        &self,
        chain: &dyn HeaderReader,
        voted_validators: FinalityVoteBitSet,
        aggregated_signature: &BlsSignature,
        target_number: u64,
        target_hash: H256,
    ) -> ConsensusResult<()> {
        let snapshot = self.snapshot(chain, target_number, target_hash)?;
        let committee_size = snapshot.validators.len();
        let need = committee_size * 2 / 3 + 1;
        let indices = voted_validators.indices();
        if indices.len() < need {
            return Err(ConsensusError::NotEnoughFinalityVote {
                have: indices.len(),
                need,
            });
        }

        let mut keys = Vec::with_capacity(indices.len());
        for index in indices {
            let validator = snapshot
                .validators
                .get(index)
                .ok_or(ConsensusError::InvalidFinalityVotedBitSet)?;
            let key = validator
                .bls_public_key
                .as_ref()
                .ok_or(ConsensusError::MissingBlsPublicKey(validator.address))?;
            keys.push(key);
        }

        let digest = VoteData {
            target_number,
            target_hash,
        }
        .hash();
        if !aggregated_signature.fast_aggregate_verify(digest.as_bytes(), &keys) {
            return Err(ConsensusError::FinalitySignatureVerificationFailed);
        }
        Ok(())
    }

    /// Verify a single gossiped finality vote before admitting it to the
    /// pool: the target must be a known block at the claimed height, the
    /// key must belong to the committee as of that block, and the
    /// signature must check out over the vote digest.
    pub fn verify_vote(
        &self,
        chain: &dyn HeaderReader,
        vote: &VoteEnvelope,
    ) -> ConsensusResult<()> {
        let header = chain
            .header_by_hash(vote.data.target_hash)
            .ok_or(ConsensusError::UnknownBlock(vote.data.target_hash))?;
        if header.number != vote.data.target_number {
            return Err(ConsensusError::InvalidTargetNumber {
                expected: header.number,
                actual: vote.data.target_number,
            });
        }

        let snapshot = self.snapshot(chain, header.number, header.hash)?;
        let authorized = snapshot
            .validators
            .iter()
            .any(|v| v.bls_public_key.as_ref() == Some(&vote.public_key));
        if !authorized {
            return Err(ConsensusError::UnauthorizedFinalityVoter);
        }

        let digest = vote.data.hash();
        if !vote.public_key.verify(digest.as_bytes(), &vote.signature) {
            return Err(ConsensusError::FinalitySignatureVerificationFailed);
        }
        Ok(())
    }

    /// While sealing `header`, collect pool votes for its parent and embed
    /// them as an aggregated finality vote in the extra-data.
    ///
    /// Votes with the wrong target height or from keys outside the parent
    /// committee are dropped; at most one vote per committee member is
    /// kept. When no usable vote exists the header is left untouched.
    pub fn assemble_finality_vote(
        &self,
        header: &mut Header,
        snapshot: &Snapshot,
    ) -> ConsensusResult<()> {
        if header.number == 0 || !self.chain_config.is_finality_vote(header.number) {
            return Ok(());
        }
        let Some(pool) = &self.vote_pool else {
            return Ok(());
        };

        let target_number = header.number - 1;
        let mut voted_validators = FinalityVoteBitSet::new();
        let mut signatures = Vec::new();
        for vote in pool.fetch_vote_by_block_hash(header.parent_hash) {
            if vote.data.target_number != target_number {
                continue;
            }
            let position = snapshot
                .validators
                .iter()
                .position(|v| v.bls_public_key.as_ref() == Some(&vote.public_key));
            let Some(position) = position else {
                debug!(target_number, "dropping finality vote from non-committee key");
                continue;
            };
            if voted_validators.test_bit(position) {
                continue;
            }
            voted_validators.set_bit(position);
            signatures.push(vote.signature);
        }

        if signatures.is_empty() {
            return Ok(());
        }

        let mut extra = HeaderExtraData::decode(&header.extra, true)?;
        extra.finality_vote = Some(FinalityVote {
            voted_validators,
            aggregated_signature: BlsSignature::aggregate(&signatures)?,
        });
        header.extra = extra.encode(true);
        debug!(
            number = header.number,
            votes = signatures.len(),
            "assembled finality vote"
        );
        Ok(())
    }

    /// System duties while finalizing `header`: report a missed in-turn
    /// slot, credit the block reward, distribute finality rewards for the
    /// embedded vote, and settle the epoch on checkpoint blocks.
    pub fn finalize_block(&self, header: &Header, snapshot: &Snapshot) -> ConsensusResult<()> {
        let number = header.number;
        if let Some(expected) = snapshot.supposed_validator(number) {
            if expected != header.coinbase {
                debug!(number, %expected, "in-turn validator missed its slot");
                self.contract.slash(number, expected)?;
            }
        }
        self.contract.submit_block_reward(number)?;

        if self.chain_config.is_finality_vote(number) {
            let extra = HeaderExtraData::decode(&header.extra, true)?;
            if let Some(vote) = extra.finality_vote {
                let mut voters: Vec<Address> = Vec::new();
                for index in vote.voted_validators.indices() {
                    let validator = snapshot
                        .validators
                        .get(index)
                        .ok_or(ConsensusError::InvalidFinalityVotedBitSet)?;
                    voters.push(validator.address);
                }
                self.contract.finality_reward(number, &voters)?;
            }
        }

        if number > 0 && self.chain_config.is_checkpoint(number) {
            self.contract.wrap_up_epoch(number)?;
        }
        Ok(())
    }
}
