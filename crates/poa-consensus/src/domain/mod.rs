//! Domain types and pure consensus algorithms.

pub mod bitset;
pub mod extra_data;
pub mod header;
pub mod snapshot;
pub mod validator;
pub mod vote;

pub use bitset::FinalityVoteBitSet;
pub use extra_data::{FinalityVote, HeaderExtraData, EXTRA_SEAL, EXTRA_VANITY};
pub use header::Header;
pub use snapshot::{backoff_time, Snapshot};
pub use validator::{Address, ValidatorWithBlsPub};
pub use vote::{VoteData, VoteEnvelope};
