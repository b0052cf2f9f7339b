//! Simulated accounts.

use crate::address::{AccAddress, EthAddress, ValAddress};
use crate::crypto::{PrivateKey, PublicKey};

/// A keyed account the simulator can sign with.
///
/// The same secp256k1 key backs the Cosmos account and the Ethereum
/// identity, so an account that delegates its own Ethereum address can sign
/// checkpoints that verify under the bridge's rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimAccount {
    pub priv_key: PrivateKey,
    pub pub_key: PublicKey,
    pub address: AccAddress,
    pub eth_address: EthAddress,
}

impl SimAccount {
    pub fn from_private_key(priv_key: PrivateKey) -> Self {
        let pub_key = priv_key.public_key();
        Self {
            address: pub_key.address(),
            eth_address: priv_key.eth_address(),
            pub_key,
            priv_key,
        }
    }

    /// Generate a fresh account from `rng`.
    pub fn generate<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_private_key(PrivateKey::generate(rng))
    }

    /// The validator operator address derived from this account.
    pub fn val_address(&self) -> ValAddress {
        ValAddress::from(&self.address)
    }
}

/// Generate `n` accounts from `rng`.
pub fn random_accounts<R: rand::Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<SimAccount> {
    (0..n).map(|_| SimAccount::generate(rng)).collect()
}

/// Find the account with address `address`.
pub fn find_account<'a>(accounts: &'a [SimAccount], address: &AccAddress) -> Option<&'a SimAccount> {
    accounts.iter().find(|a| &a.address == address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_accounts_are_deterministic() {
        let a = random_accounts(&mut ChaCha8Rng::seed_from_u64(7), 3);
        let b = random_accounts(&mut ChaCha8Rng::seed_from_u64(7), 3);
        assert_eq!(a, b);
        assert_ne!(a[0].address, a[1].address);
    }

    #[test]
    fn test_val_address_shares_bytes() {
        let account = SimAccount::generate(&mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(account.val_address().account(), account.address);
    }

    #[test]
    fn test_find_account() {
        let accounts = random_accounts(&mut ChaCha8Rng::seed_from_u64(2), 4);
        let target = accounts[2].address;
        assert_eq!(find_account(&accounts, &target), Some(&accounts[2]));
        assert_eq!(find_account(&accounts, &AccAddress([0; 20])), None);
    }
}
