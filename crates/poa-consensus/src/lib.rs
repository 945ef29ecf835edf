//! # poa-consensus
//!
//! Proof-of-authority consensus core: committee rotation with a recency
//! window, deterministic sealing backoff, and BLS-backed fast finality.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Committee snapshots**: point-in-time validator sets advanced header
//!   by header and rebuilt from epoch checkpoints
//! - **Turn rotation**: round-robin slot assignment with a sliding recency
//!   window keeping half the committee out of consecutive slots
//! - **Deterministic backoff**: per-height pseudo-random sealing delays for
//!   out-of-turn proposers
//! - **Fast finality**: 2/3-quorum aggregated BLS votes embedded in header
//!   extra-data and re-verified on import
//!
//! ## Architecture
//!
//! ```text
//! HeaderReader ──headers──→ ConsensusService ──snapshots──→ KeyValueStore
//!                                  │
//!                                  ├── committee / keys ──→ ValidatorContract
//!                                  │
//!                                  └── finality votes ←── VotePool
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use poa_consensus::{ChainConfig, ConsensusService};
//!
//! let engine = ConsensusService::new(ChainConfig::default(), contract, vote_pool, db);
//!
//! let snapshot = engine.snapshot(&chain, parent.number, parent.hash)?;
//! engine.verify_header_time(&header, &parent, &snapshot)?;
//! engine.assemble_finality_vote(&mut header, &snapshot)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use cache::SnapshotCache;
pub use config::ChainConfig;
pub use domain::{
    backoff_time, Address, FinalityVote, FinalityVoteBitSet, Header, HeaderExtraData, Snapshot,
    ValidatorWithBlsPub, VoteData, VoteEnvelope, EXTRA_SEAL, EXTRA_VANITY,
};
pub use error::{ConsensusError, ConsensusResult};
pub use ports::outbound::{HeaderReader, KeyValueStore, ValidatorContract, VotePool};
pub use service::{ConsensusService, DEFAULT_SNAPSHOT_CACHE_SIZE};
