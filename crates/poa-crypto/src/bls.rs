//! BLS12-381 signatures (min_pk: 48-byte public keys, 96-byte signatures).
//!
//! Provides the primitive set consumed by the finality-vote subsystem:
//! key generation, single-message signing, signature aggregation and
//! aggregate verification where every signer signed the same digest.

use blst::min_pk::{AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand::RngCore;
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::CryptoError;

/// Domain separation tag for BLS signatures (proof-of-possession scheme).
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Compressed public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// Compressed signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 96;

/// BLS public key (48 bytes compressed).
#[derive(Clone, Debug)]
pub struct BlsPublicKey(PublicKey);

impl PartialEq for BlsPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsPublicKey {}

/// BLS signature (96 bytes compressed).
#[derive(Clone, Debug)]
pub struct BlsSignature(Signature);

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

/// BLS key pair for signing operations.
pub struct BlsKeyPair {
    secret: SecretKey,
    public: BlsPublicKey,
}

impl BlsKeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut ikm = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut ikm);
        // key_gen only fails on short IKM, ours is always 32 bytes
        let secret = SecretKey::key_gen(&ikm, &[]).expect("32-byte IKM");
        ikm.zeroize();
        let public = BlsPublicKey(secret.sk_to_pk());
        Self { secret, public }
    }

    /// Restore a key pair from secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        let public = BlsPublicKey(secret.sk_to_pk());
        Ok(Self { secret, public })
    }

    /// Sign a message digest.
    pub fn sign(&self, message: &[u8]) -> BlsSignature {
        BlsSignature(self.secret.sign(message, DST, &[]))
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> BlsPublicKey {
        self.public.clone()
    }
}

impl BlsPublicKey {
    /// Decode from the 48-byte compressed representation, validating that
    /// the bytes are a point on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        PublicKey::from_bytes(bytes)
            .map(BlsPublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Serialize to the 48-byte compressed form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Verify a single signature against this key.
    pub fn verify(&self, message: &[u8], signature: &BlsSignature) -> bool {
        signature.0.verify(true, message, DST, &[], &self.0, true) == BLST_ERROR::BLST_SUCCESS
    }
}

impl BlsSignature {
    /// Decode from the 96-byte compressed representation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        Signature::from_bytes(bytes)
            .map(BlsSignature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Serialize to the 96-byte compressed form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Aggregate signatures into one. Aggregation is commutative, callers
    /// may pass signatures in any order.
    pub fn aggregate(signatures: &[BlsSignature]) -> Result<Self, CryptoError> {
        if signatures.is_empty() {
            return Err(CryptoError::EmptyAggregation);
        }
        let refs: Vec<&Signature> = signatures.iter().map(|s| &s.0).collect();
        AggregateSignature::aggregate(&refs, true)
            .map(|agg| BlsSignature(agg.to_signature()))
            .map_err(|_| CryptoError::AggregationFailed)
    }

    /// Verify this signature as an aggregate over `public_keys`, all of
    /// which signed the same `message`. Fails for any signer subset other
    /// than exactly `public_keys`.
    pub fn fast_aggregate_verify(&self, message: &[u8], public_keys: &[&BlsPublicKey]) -> bool {
        if public_keys.is_empty() {
            return false;
        }
        let refs: Vec<&PublicKey> = public_keys.iter().map(|k| &k.0).collect();
        self.0.fast_aggregate_verify(true, message, DST, &refs) == BLST_ERROR::BLST_SUCCESS
    }
}

// Snapshots persist committee public keys, so keys serialize as their
// compressed bytes and re-validate the curve point on load.
impl Serialize for BlsPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = BlsPublicKey;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{PUBLIC_KEY_LENGTH} compressed BLS public key bytes")
            }

            fn visit_bytes<E: DeError>(self, v: &[u8]) -> Result<Self::Value, E> {
                BlsPublicKey::from_bytes(v).map_err(|e| E::custom(e.to_string()))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::with_capacity(PUBLIC_KEY_LENGTH);
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                BlsPublicKey::from_bytes(&bytes).map_err(|e| A::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_bytes(BytesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let keypair = BlsKeyPair::generate();
        let message = b"test message";
        let signature = keypair.sign(message);
        assert!(keypair.public_key().verify(message, &signature));
    }

    #[test]
    fn test_wrong_message_rejected() {
        let keypair = BlsKeyPair::generate();
        let signature = keypair.sign(b"test message");
        assert!(!keypair.public_key().verify(b"another message", &signature));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = BlsKeyPair::generate();
        let other = BlsKeyPair::generate();
        let message = b"test message";
        let signature = signer.sign(message);
        assert!(!other.public_key().verify(message, &signature));
    }

    #[test]
    fn test_fast_aggregate_verify_exact_subset() {
        let keypairs: Vec<BlsKeyPair> = (0..4).map(|_| BlsKeyPair::generate()).collect();
        let message = b"same digest";

        let signatures: Vec<BlsSignature> = keypairs.iter().map(|kp| kp.sign(message)).collect();
        let aggregate = BlsSignature::aggregate(&signatures[..3]).unwrap();

        let keys: Vec<BlsPublicKey> = keypairs.iter().map(|kp| kp.public_key()).collect();
        let first_three: Vec<&BlsPublicKey> = keys[..3].iter().collect();
        assert!(aggregate.fast_aggregate_verify(message, &first_three));

        // A superset of the actual signers must not verify
        let all_four: Vec<&BlsPublicKey> = keys.iter().collect();
        assert!(!aggregate.fast_aggregate_verify(message, &all_four));

        // Nor a different subset of the same size
        let shifted: Vec<&BlsPublicKey> = keys[1..4].iter().collect();
        assert!(!aggregate.fast_aggregate_verify(message, &shifted));
    }

    #[test]
    fn test_aggregate_empty_fails() {
        assert_eq!(
            BlsSignature::aggregate(&[]),
            Err(CryptoError::EmptyAggregation)
        );
    }

    #[test]
    fn test_aggregate_order_independent() {
        let kp1 = BlsKeyPair::generate();
        let kp2 = BlsKeyPair::generate();
        let message = b"digest";

        let forward = BlsSignature::aggregate(&[kp1.sign(message), kp2.sign(message)]).unwrap();
        let backward = BlsSignature::aggregate(&[kp2.sign(message), kp1.sign(message)]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let keypair = BlsKeyPair::generate();
        let restored = BlsPublicKey::from_bytes(&keypair.public_key().to_bytes()).unwrap();
        assert_eq!(keypair.public_key(), restored);

        let signature = keypair.sign(b"msg");
        let restored = BlsSignature::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(signature, restored);
    }

    #[test]
    fn test_public_key_serde_roundtrip() {
        let key = BlsKeyPair::generate().public_key();
        let encoded = bincode::serialize(&key).unwrap();
        let decoded: BlsPublicKey = bincode::deserialize(&encoded).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_invalid_point_rejected() {
        let zeroes = [0u8; PUBLIC_KEY_LENGTH];
        assert!(BlsPublicKey::from_bytes(&zeroes).is_err());
    }

    #[test]
    fn test_from_secret_bytes_restores_keypair() {
        let ikm = [7u8; 32];
        let secret = SecretKey::key_gen(&ikm, &[]).unwrap();
        let keypair = BlsKeyPair::from_secret_bytes(&secret.to_bytes()).unwrap();
        let message = b"msg";
        assert!(keypair.public_key().verify(message, &keypair.sign(message)));
    }
}
