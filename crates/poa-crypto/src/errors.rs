//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Bytes do not decode to a valid public key (wrong length or not a
    /// point on the curve)
    #[error("Invalid BLS public key")]
    InvalidPublicKey,

    /// Bytes do not decode to a valid secret key scalar
    #[error("Invalid BLS secret key")]
    InvalidSecretKey,

    /// Bytes do not decode to a valid signature
    #[error("Invalid BLS signature")]
    InvalidSignature,

    /// Aggregation over an empty input set
    #[error("Nothing to aggregate")]
    EmptyAggregation,

    /// Aggregation rejected by the underlying library
    #[error("BLS aggregation failed")]
    AggregationFailed,
}
