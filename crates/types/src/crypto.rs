//! secp256k1 keys and signatures.
//!
//! One key serves both sides of the bridge, the same way a simulated
//! validator's Cosmos key is reused as its Ethereum key:
//! - Cosmos transactions: ECDSA over SHA-256 of the sign bytes, 64-byte compact signature
//! - Ethereum checkpoints: recoverable ECDSA over the Ethereum signed-message
//!   hash, 65-byte `r || s || v` signature

use crate::address::{AccAddress, EthAddress, ADDRESS_LEN};
use crate::hash::Hash;
use alloy_primitives::eip191_hash_message;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

/// Length of an Ethereum signature (`r || s || v`).
pub const ETH_SIGNATURE_LEN: usize = 65;

fn secp() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

/// Errors from key handling, signing and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signature does not match: expected signer {expected}, recovered {recovered}")]
    SignerMismatch {
        expected: EthAddress,
        recovered: EthAddress,
    },

    #[error("signature verification failed")]
    VerificationFailed,
}

/// A secp256k1 private key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Parse a 32-byte private key. Fails for malformed or out-of-range keys.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
    }

    /// Draw a key from `rng` (for testing/simulation).
    pub fn generate<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // Rejection sampling: almost every 32-byte string is in range.
            if let Ok(key) = SecretKey::from_slice(&bytes) {
                return Self(key);
            }
        }
    }

    /// Raw key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(secp256k1::PublicKey::from_secret_key(secp(), &self.0).serialize())
    }

    /// Ethereum address controlled by this key.
    pub fn eth_address(&self) -> EthAddress {
        let pk = secp256k1::PublicKey::from_secret_key(secp(), &self.0);
        EthAddress::from_uncompressed_public_key(&pk.serialize_uncompressed())
    }

    /// Sign Cosmos transaction sign bytes.
    pub fn sign_tx_bytes(&self, sign_bytes: &[u8]) -> TxSignature {
        let digest: [u8; 32] = Sha256::digest(sign_bytes).into();
        let message = Message::from_digest(digest);
        TxSignature(secp().sign_ecdsa(&message, &self.0).serialize_compact())
    }

    /// Produce a recoverable signature over a 32-byte hash, `v ∈ {0, 1}`.
    pub fn sign_recoverable(&self, hash: &Hash) -> EthSignature {
        let message = Message::from_digest(hash.to_bytes());
        let (recovery_id, compact) = secp()
            .sign_ecdsa_recoverable(&message, &self.0)
            .serialize_compact();

        let mut out = [0u8; ETH_SIGNATURE_LEN];
        out[..64].copy_from_slice(&compact);
        out[64] = recovery_id.to_i32() as u8;
        EthSignature::from(out)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(..)")
    }
}

/// A compressed secp256k1 public key (33 bytes).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde_as(as = "Hex")] pub [u8; 33]);

impl PublicKey {
    /// Cosmos account address: first 20 bytes of SHA-256 over the compressed key.
    pub fn address(&self) -> AccAddress {
        let digest = Sha256::digest(self.0);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest[..ADDRESS_LEN]);
        AccAddress(out)
    }

    /// Verify a Cosmos transaction signature.
    pub fn verify_tx_bytes(&self, sign_bytes: &[u8], signature: &TxSignature) -> bool {
        let Ok(pk) = secp256k1::PublicKey::from_slice(&self.0) else {
            return false;
        };
        let Ok(sig) = secp256k1::ecdsa::Signature::from_compact(&signature.0) else {
            return false;
        };
        let digest: [u8; 32] = Sha256::digest(sign_bytes).into();
        secp()
            .verify_ecdsa(&Message::from_digest(digest), &sig, &pk)
            .is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}..)", &hex::encode(self.0)[..16])
    }
}

/// Compact 64-byte Cosmos transaction signature.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxSignature(#[serde_as(as = "Hex")] pub [u8; 64]);

impl fmt::Debug for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxSignature({}..)", &hex::encode(self.0)[..16])
    }
}

/// Ethereum signature `r || s || v`.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthSignature(#[serde_as(as = "Hex")] pub Vec<u8>);

impl EthSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<[u8; ETH_SIGNATURE_LEN]> for EthSignature {
    fn from(bytes: [u8; ETH_SIGNATURE_LEN]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "EthSignature({}..)", &hex[..hex.len().min(16)])
    }
}

/// The hash an Ethereum wallet actually signs for a 32-byte message hash
/// (EIP-191 personal message).
pub fn ethereum_signed_hash(hash: &Hash) -> Hash {
    Hash::from_hash_bytes(eip191_hash_message(hash.as_bytes()).0)
}

/// Sign `hash` the way the bridge contract expects validators to.
pub fn new_ethereum_signature(hash: &Hash, key: &PrivateKey) -> EthSignature {
    key.sign_recoverable(&ethereum_signed_hash(hash))
}

/// Recover the signer of `hash` from an Ethereum signature.
///
/// Accepts both the raw (`0`/`1`) and the legacy (`27`/`28`) recovery byte.
pub fn recover_ethereum_signer(
    hash: &Hash,
    signature: &EthSignature,
) -> Result<EthAddress, SigningError> {
    if signature.len() != ETH_SIGNATURE_LEN {
        return Err(SigningError::InvalidSignatureLength {
            expected: ETH_SIGNATURE_LEN,
            actual: signature.len(),
        });
    }
    let bytes = signature.as_bytes();
    let v = match bytes[64] {
        v @ 0..=1 => v,
        v @ 27..=28 => v - 27,
        other => {
            return Err(SigningError::MalformedSignature(format!(
                "invalid recovery byte {other}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_i32(i32::from(v))
        .map_err(|e| SigningError::MalformedSignature(e.to_string()))?;
    let sig = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|e| SigningError::MalformedSignature(e.to_string()))?;

    let message = Message::from_digest(ethereum_signed_hash(hash).to_bytes());
    let pk = secp()
        .recover_ecdsa(&message, &sig)
        .map_err(|_| SigningError::VerificationFailed)?;
    Ok(EthAddress::from_uncompressed_public_key(
        &pk.serialize_uncompressed(),
    ))
}

/// Check that `signature` over `hash` was produced by `expected`.
pub fn validate_ethereum_signature(
    hash: &Hash,
    signature: &EthSignature,
    expected: &EthAddress,
) -> Result<(), SigningError> {
    let recovered = recover_ethereum_signer(hash, signature)?;
    if &recovered != expected {
        return Err(SigningError::SignerMismatch {
            expected: *expected,
            recovered,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn key(seed: u64) -> PrivateKey {
        PrivateKey::generate(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_known_private_key_address() {
        // Private key 0x…01 controls this well-known address.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let key = PrivateKey::from_bytes(&bytes).unwrap();
        assert_eq!(
            key.eth_address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_signed_hash_uses_personal_message_prefix() {
        let hash = Hash::from_bytes(b"checkpoint");
        let expected = Hash::from_parts(&[b"\x19Ethereum Signed Message:\n32", hash.as_bytes()]);
        assert_eq!(ethereum_signed_hash(&hash), expected);
    }

    #[test]
    fn test_rejects_malformed_private_key() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
        assert!(PrivateKey::from_bytes(&[0xff; 32]).is_err());
    }

    #[test]
    fn test_ethereum_signature_recovers_signer() {
        let key = key(1);
        let hash = Hash::from_bytes(b"checkpoint");
        let sig = new_ethereum_signature(&hash, &key);

        assert_eq!(sig.len(), ETH_SIGNATURE_LEN);
        assert!(sig.as_bytes()[64] <= 1);
        assert!(validate_ethereum_signature(&hash, &sig, &key.eth_address()).is_ok());
    }

    #[test]
    fn test_legacy_recovery_byte_accepted() {
        let key = key(2);
        let hash = Hash::from_bytes(b"legacy");
        let mut sig = new_ethereum_signature(&hash, &key);
        sig.0[64] += 27;
        assert!(validate_ethereum_signature(&hash, &sig, &key.eth_address()).is_ok());
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let hash = Hash::from_bytes(b"checkpoint");
        let sig = new_ethereum_signature(&hash, &key(3));
        assert!(matches!(
            validate_ethereum_signature(&hash, &sig, &key(4).eth_address()),
            Err(SigningError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn test_short_signature_rejected() {
        let hash = Hash::from_bytes(b"x");
        let sig = EthSignature(vec![0u8; 64]);
        assert!(matches!(
            recover_ethereum_signer(&hash, &sig),
            Err(SigningError::InvalidSignatureLength { .. })
        ));
    }

    #[test]
    fn test_tx_signature_roundtrip() {
        let key = key(5);
        let sig = key.sign_tx_bytes(b"sign doc");
        assert!(key.public_key().verify_tx_bytes(b"sign doc", &sig));
        assert!(!key.public_key().verify_tx_bytes(b"sign doc!", &sig));
    }
}
