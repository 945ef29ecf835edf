//! Committee snapshot: who may seal, recency tracking and backoff delays.

use std::collections::BTreeMap;

use primitive_types::H256;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::extra_data::HeaderExtraData;
use super::header::Header;
use super::validator::{Address, ValidatorWithBlsPub};
use crate::config::ChainConfig;
use crate::error::{ConsensusError, ConsensusResult};
use crate::ports::outbound::KeyValueStore;

/// Store key prefix for persisted snapshots, suffixed with the block hash.
const STORE_KEY_PREFIX: &[u8] = b"poa-snapshot-";

/// Point-in-time committee state as of a specific block.
///
/// Snapshots are immutable values: advancing one produces a new snapshot,
/// so a cached instance may be advanced concurrently along divergent fork
/// branches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Block this snapshot reflects
    pub number: u64,
    /// Hash of that block
    pub hash: H256,
    /// Committee in index order (addresses ascending, unique)
    pub validators: Vec<ValidatorWithBlsPub>,
    /// Sealer of each block inside the sliding recency window
    pub recents: BTreeMap<u64, Address>,
}

impl Snapshot {
    /// Fresh snapshot at an epoch checkpoint. Validators are re-sorted by
    /// address; the order assigns turn ranks and bitset indices.
    pub fn new(number: u64, hash: H256, validators: Vec<ValidatorWithBlsPub>) -> Self {
        Self {
            number,
            hash,
            validators: sort_by_address(validators),
            recents: BTreeMap::new(),
        }
    }

    /// Size of the recency window: a validator that sealed one of the last
    /// `limit` blocks may not seal again until it ages out.
    pub fn recency_limit(&self) -> u64 {
        self.validators.len() as u64 / 2 + 1
    }

    /// Whether `address` sealed a block still blocking it for candidate
    /// block `next`.
    fn sealed_recently(&self, address: Address, next: u64) -> bool {
        let limit = self.recency_limit();
        self.recents
            .iter()
            .any(|(&sealed, &sealer)| sealer == address && next.saturating_sub(sealed) < limit)
    }

    /// Rank of `address` among validators currently allowed to seal the
    /// next block, and the count of such validators. Rank is `None` when
    /// the address is inside the recency window or not a committee member.
    pub fn sealable_validators(&self, address: Address) -> (Option<usize>, usize) {
        let next = self.number + 1;
        let mut position = None;
        let mut count = 0usize;
        for validator in &self.validators {
            if self.sealed_recently(validator.address, next) {
                continue;
            }
            if validator.address == address {
                position = Some(count);
            }
            count += 1;
        }
        (position, count)
    }

    /// The committee member whose rotation slot is block `number`, over the
    /// full committee regardless of recency.
    pub fn supposed_validator(&self, number: u64) -> Option<Address> {
        if self.validators.is_empty() {
            return None;
        }
        let index = (number % self.validators.len() as u64) as usize;
        Some(self.validators[index].address)
    }

    /// Whether `address` holds the rotation slot for the next block.
    pub fn inturn(&self, address: Address) -> bool {
        self.supposed_validator(self.number + 1) == Some(address)
    }

    /// Committee index of `address`, if it is a member.
    pub fn validator_index(&self, address: Address) -> Option<usize> {
        self.validators.iter().position(|v| v.address == address)
    }

    /// Advance this snapshot across `headers`, returning a new snapshot.
    /// Headers must chain directly off this snapshot's block.
    pub fn apply(&self, headers: &[Header], config: &ChainConfig) -> ConsensusResult<Snapshot> {
        let mut snap = self.clone();
        if headers.is_empty() {
            return Ok(snap);
        }

        let mut expected_number = self.number + 1;
        let mut expected_parent = self.hash;
        for header in headers {
            if header.number != expected_number || header.parent_hash != expected_parent {
                return Err(ConsensusError::NonContiguousHeaders {
                    number: header.number,
                });
            }
            expected_number = header.number + 1;
            expected_parent = header.hash;
        }

        for header in headers {
            let number = header.number;
            snap.recents.insert(number, header.coinbase);
            if config.is_checkpoint(number) {
                let extra =
                    HeaderExtraData::decode(&header.extra, config.is_finality_vote(number))?;
                if !extra.checkpoint_validators.is_empty() {
                    snap.validators = sort_by_address(extra.checkpoint_validators);
                }
            }
            // Drop entries that can no longer block any sealer.
            let limit = snap.recency_limit();
            snap.recents
                .retain(|&sealed, _| (number + 1).saturating_sub(sealed) < limit);
            snap.number = number;
            snap.hash = header.hash;
        }
        Ok(snap)
    }

    /// Persist this snapshot keyed by its block hash.
    pub fn store(&self, db: &dyn KeyValueStore) -> ConsensusResult<()> {
        let blob = bincode::serialize(self).map_err(|err| ConsensusError::Storage {
            reason: err.to_string(),
        })?;
        db.put(&store_key(&self.hash), &blob)
    }

    /// Load a persisted snapshot for `hash`, if one exists.
    pub fn load(db: &dyn KeyValueStore, hash: H256) -> ConsensusResult<Option<Snapshot>> {
        match db.get(&store_key(&hash))? {
            Some(blob) => bincode::deserialize(&blob)
                .map(Some)
                .map_err(|err| ConsensusError::Storage {
                    reason: err.to_string(),
                }),
            None => Ok(None),
        }
    }
}

fn sort_by_address(mut validators: Vec<ValidatorWithBlsPub>) -> Vec<ValidatorWithBlsPub> {
    validators.sort_by(|a, b| a.address.cmp(&b.address));
    validators
}

fn store_key(hash: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(STORE_KEY_PREFIX.len() + 32);
    key.extend_from_slice(STORE_KEY_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

/// Seconds the proposer of `header` must wait past the parent timestamp and
/// block period before its block is valid. Deterministic: every node derives
/// the same delay for the same header.
///
/// In-turn and eligible proposers wait 0. Out-of-turn eligible proposers get
/// a delay from a per-height pseudo-random permutation of their sealable
/// rank, bounded so collisions stay rare: at most two proposers share a
/// value before the extended-backoff hardfork, at most one after it.
pub fn backoff_time(header: &Header, snapshot: &Snapshot, config: &ChainConfig) -> u64 {
    let number = header.number;
    let Some(in_turn) = snapshot.supposed_validator(number) else {
        return 0;
    };
    let (position, sealable_count) = snapshot.sealable_validators(header.coinbase);

    if header.coinbase == in_turn {
        return match position {
            Some(_) => 0,
            // Recently sealed: before the extended-backoff hardfork keep one
            // wiggle of headroom so the slot can be taken over; afterwards
            // the recency restriction alone is enough.
            None => {
                if config.is_extended_backoff(number) {
                    0
                } else {
                    config.wiggle
                }
            }
        };
    }

    let Some(position) = position else {
        // Inside the recency window and out of turn: cannot seal at this
        // height, the delay is irrelevant.
        return 0;
    };
    if sealable_count == 0 {
        return 0;
    }

    let steps = backoff_permutation(number, sealable_count);
    if config.is_extended_backoff(number) {
        let (in_turn_position, _) = snapshot.sealable_validators(in_turn);
        if in_turn_position.is_some() {
            // Slot 0 belongs to the in-turn proposer; everyone else gets a
            // distinct positive delay.
            (steps[position] + 1) * config.wiggle
        } else {
            // The in-turn proposer cannot seal, let the permutation hand
            // delay 0 to exactly one eligible proposer instead.
            steps[position] * config.wiggle
        }
    } else {
        // Folded range [1, count/2 + 1]: each value lands on at most two
        // proposers because the steps are a permutation of 0..count.
        (steps[position] % (sealable_count as u64 / 2 + 1) + 1) * config.wiggle
    }
}

/// Permutation of `0..count` reproducible from the block number alone.
/// ChaCha8 is pinned here because the shuffle is consensus-critical; the
/// default `StdRng` makes no cross-version stability promise.
fn backoff_permutation(number: u64, count: usize) -> Vec<u64> {
    let mut steps: Vec<u64> = (0..count as u64).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(number);
    steps.shuffle(&mut rng);
    steps
}
