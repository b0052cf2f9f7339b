//! Deterministic fixtures for tests.

use crate::account::SimAccount;
use crate::crypto::PrivateKey;

/// An account whose private key is `seed` as a big-endian scalar (seed must be non-zero).
pub fn test_account(seed: u64) -> SimAccount {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&seed.max(1).to_be_bytes());
    let key = PrivateKey::from_bytes(&bytes).expect("small non-zero scalar is a valid key");
    SimAccount::from_private_key(key)
}

/// `n` distinct accounts with seeds `1..=n`.
pub fn test_accounts(n: usize) -> Vec<SimAccount> {
    (1..=n as u64).map(test_account).collect()
}
