//! Committee member entity.

use poa_crypto::BlsPublicKey;
use serde::{Deserialize, Serialize};

/// 20-byte account address identifying a validator.
pub type Address = primitive_types::H160;

/// Address length in bytes inside the header extra-data.
pub const ADDRESS_LENGTH: usize = 20;

/// A committee member: an address, optionally paired with the BLS public
/// key it uses for finality votes. The key is absent on committees formed
/// before the finality hardfork.
///
/// Committee order is significant: it assigns both the turn-rotation rank
/// and the finality-bitset index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorWithBlsPub {
    /// Account address of the validator
    pub address: Address,
    /// BLS public key registered for finality voting, if any
    pub bls_public_key: Option<BlsPublicKey>,
}

impl ValidatorWithBlsPub {
    /// Address-only validator (pre-finality-hardfork committees).
    pub fn new(address: Address) -> Self {
        Self {
            address,
            bls_public_key: None,
        }
    }

    /// Validator with a registered finality-vote key.
    pub fn with_key(address: Address, key: BlsPublicKey) -> Self {
        Self {
            address,
            bls_public_key: Some(key),
        }
    }
}
