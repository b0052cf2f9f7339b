//! Account, validator and Ethereum address types.
//!
//! Cosmos-side addresses are 20 bytes rendered as bech32 strings. The same
//! bytes back an account address and the validator operator address derived
//! from it, only the human readable prefix differs. Ethereum addresses are
//! rendered as EIP-55 checksummed hex.

use alloy_primitives::Address;
use bech32::{FromBase32, ToBase32, Variant};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// Bech32 prefix for account addresses.
pub const ACCOUNT_PREFIX: &str = "cosmos";

/// Bech32 prefix for validator operator addresses.
pub const VALIDATOR_PREFIX: &str = "cosmosvaloper";

/// Length in bytes of every address type in this module.
pub const ADDRESS_LEN: usize = 20;

/// Errors from parsing or building addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid bech32 address: {0}")]
    Bech32(String),

    #[error("wrong address prefix: expected {expected}, got {actual}")]
    WrongPrefix { expected: String, actual: String },

    #[error("invalid address length: expected 20, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex address: {0}")]
    InvalidHex(String),
}

fn encode_bech32(prefix: &str, bytes: &[u8]) -> Result<String, AddressError> {
    bech32::encode(prefix, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| AddressError::Bech32(e.to_string()))
}

fn decode_bech32(prefix: &str, s: &str) -> Result<[u8; ADDRESS_LEN], AddressError> {
    let (hrp, data, _variant) =
        bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
    if hrp != prefix {
        return Err(AddressError::WrongPrefix {
            expected: prefix.to_string(),
            actual: hrp,
        });
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32(e.to_string()))?;
    to_fixed(&bytes)
}

fn to_fixed(bytes: &[u8]) -> Result<[u8; ADDRESS_LEN], AddressError> {
    bytes
        .try_into()
        .map_err(|_| AddressError::InvalidLength(bytes.len()))
}

/// Account address (`cosmos1…`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct AccAddress(pub [u8; ADDRESS_LEN]);

impl AccAddress {
    /// Build an address from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        to_fixed(bytes).map(Self)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = encode_bech32(ACCOUNT_PREFIX, &self.0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccAddress({})", self)
    }
}

impl FromStr for AccAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bech32(ACCOUNT_PREFIX, s).map(Self)
    }
}

/// Validator operator address (`cosmosvaloper1…`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct ValAddress(pub [u8; ADDRESS_LEN]);

impl ValAddress {
    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// The account address sharing these bytes.
    pub fn account(&self) -> AccAddress {
        AccAddress(self.0)
    }
}

impl From<&AccAddress> for ValAddress {
    fn from(addr: &AccAddress) -> Self {
        ValAddress(addr.0)
    }
}

impl fmt::Display for ValAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = encode_bech32(VALIDATOR_PREFIX, &self.0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for ValAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValAddress({})", self)
    }
}

impl FromStr for ValAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bech32(VALIDATOR_PREFIX, s).map(Self)
    }
}

/// Ethereum address, displayed with the EIP-55 mixed-case checksum.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct EthAddress(pub [u8; ADDRESS_LEN]);

impl EthAddress {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Address of an uncompressed secp256k1 public key (65 bytes, `0x04` prefix).
    pub fn from_uncompressed_public_key(key: &[u8; 65]) -> Self {
        Self::from(Address::from_raw_public_key(&key[1..]))
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_lower_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Checks whether `s` is a syntactically valid hex address (with or without `0x`).
    pub fn is_hex_address(s: &str) -> bool {
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        s.len() == 2 * ADDRESS_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl From<Address> for EthAddress {
    fn from(address: Address) -> Self {
        Self(address.into_array())
    }
}

impl From<EthAddress> for Address {
    fn from(address: EthAddress) -> Self {
        Address::new(address.0)
    }
}

/// EIP-55 checksummed `0x…` hex.
impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Address::from(*self).to_checksum(None))
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self)
    }
}

impl FromStr for EthAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_hex_address(s) {
            return Err(AddressError::InvalidHex(s.to_string()));
        }
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_and_validator_share_bytes() {
        let acc = AccAddress([7u8; 20]);
        let val = ValAddress::from(&acc);

        assert!(acc.to_string().starts_with("cosmos1"));
        assert!(val.to_string().starts_with("cosmosvaloper1"));
        assert_eq!(val.account(), acc);
        assert_eq!(acc.to_string().parse::<AccAddress>().unwrap(), acc);
        assert_eq!(val.to_string().parse::<ValAddress>().unwrap(), val);
    }

    #[test]
    fn test_prefix_mismatch_rejected() {
        let val = ValAddress([1u8; 20]).to_string();
        assert!(matches!(
            val.parse::<AccAddress>(),
            Err(AddressError::WrongPrefix { .. })
        ));
    }

    #[test]
    fn test_eip55_checksum() {
        // Test vector from EIP-55.
        let addr: EthAddress = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(addr.to_string(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_is_hex_address() {
        assert!(EthAddress::is_hex_address(
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        ));
        assert!(EthAddress::is_hex_address(
            "fB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        ));
        assert!(!EthAddress::is_hex_address("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d35"));
        assert!(!EthAddress::is_hex_address("cosmos1qqqq"));
    }

    #[test]
    fn test_serde_uses_string_forms() {
        let addr = EthAddress([0xab; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: EthAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
