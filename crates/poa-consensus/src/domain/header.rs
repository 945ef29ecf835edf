//! Block header view consumed by the consensus core.

use primitive_types::H256;

use super::validator::Address;

/// The header fields the consensus core reads and writes. Body, state roots
/// and execution payloads live with the (external) block database.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// Block height
    pub number: u64,
    /// Hash identifying this block
    pub hash: H256,
    /// Hash of the parent block
    pub parent_hash: H256,
    /// Address of the validator that produced the block
    pub coinbase: Address,
    /// Unix timestamp in seconds
    pub time: u64,
    /// Extension region: vanity, checkpoint committee, finality vote, seal
    pub extra: Vec<u8>,
}
