//! Cryptographic hash type using Keccak-256.

use serde::{Deserialize, Serialize};
use alloy_primitives::Keccak256;
use std::fmt;

/// A 32-byte Keccak-256 hash, the digest function of the Ethereum side of the bridge.
///
/// All hashing operations are deterministic and byte-compatible with
/// `keccak256` as computed by Solidity and go-ethereum.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Size of hash in bytes.
    pub const BYTES: usize = 32;

    /// Zero hash (all bytes are 0x00).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create hash from bytes using Keccak-256.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(alloy_primitives::keccak256(bytes).0)
    }

    /// Create a Hash from raw hash bytes (without hashing).
    pub fn from_hash_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create hash from multiple byte slices.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Keccak256::new();
        for part in parts {
            hasher.update(*part);
        }
        Self(hasher.finalize().0)
    }

    /// Parse hash from hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        if hex.len() != 64 {
            return Err(HexError::InvalidLength {
                expected: 64,
                actual: hex.len(),
            });
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| HexError::InvalidHex)?;

        Ok(Self(bytes))
    }

    /// Convert hash to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get bytes as slice reference.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to bytes array.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Errors that can occur when parsing hex strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Invalid hex string length.
    #[error("Invalid hex length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid hex characters.
    #[error("Invalid hex string")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        assert_eq!(Hash::from_bytes(data), Hash::from_bytes(data));
    }

    #[test]
    fn test_keccak_known_vector() {
        // keccak256("") as published by the Ethereum yellow paper.
        assert_eq!(
            Hash::from_bytes(b"").to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_from_parts_matches_concatenation() {
        let joined = Hash::from_bytes(b"checkpoint-payload");
        let parts = Hash::from_parts(&[b"checkpoint", b"-", b"payload"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_hex_roundtrip_with_prefix() {
        let original = Hash::from_bytes(b"test data");
        let parsed = Hash::from_hex(&original.to_string()).unwrap();
        assert_eq!(original, parsed);
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_is_zero() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::from_bytes(b"test").is_zero());
    }
}
