//! # poa-crypto
//!
//! Cryptographic primitives for the PoA consensus core.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `bls` | BLS12-381 (min_pk) | Finality vote signatures and aggregation |
//! | `hashing` | Keccak-256 | Vote digests and header identity |
//!
//! The BLS layer wraps `blst` behind owned key/signature types so the
//! consensus core never touches raw curve points. Aggregate verification is
//! the single-message fast path: every finality vote for a block signs the
//! same digest.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bls;
pub mod errors;
pub mod hashing;

pub use bls::{BlsKeyPair, BlsPublicKey, BlsSignature};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_concat};
