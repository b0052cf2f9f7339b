//! Test fixtures for the Gravity simulator.
//!
//! Builds a [`SimChain`] with deterministic accounts, a chosen validator
//! subset, and optionally delegated Ethereum keys so that a signer set is
//! pending from the first block.
//!
//! ```ignore
//! let net = TestNetwork::builder(5)
//!     .with_validators_at(&[1, 3])
//!     .with_delegated_keys()
//!     .build();
//! assert_eq!(net.validators().count(), 2);
//! ```

use gravity_core::SimApp;
use gravity_simulation::{GenesisConfig, SimChain};
use gravity_types::test_utils::test_accounts;
use gravity_types::{ContractCallTx, EthAddress, SimAccount, ValAddress};
use std::collections::BTreeSet;

/// Default genesis balance in the bond denom.
pub const DEFAULT_BALANCE: u128 = 1_000_000;

/// A chain plus the accounts that can sign on it.
pub struct TestNetwork {
    pub chain: SimChain,
    pub accounts: Vec<SimAccount>,
    validator_indices: BTreeSet<usize>,
}

impl TestNetwork {
    pub fn builder(accounts: usize) -> TestNetworkBuilder {
        TestNetworkBuilder::new(accounts)
    }

    /// Accounts that are validators at genesis.
    pub fn validators(&self) -> impl Iterator<Item = &SimAccount> {
        self.accounts
            .iter()
            .enumerate()
            .filter(|(i, _)| self.validator_indices.contains(i))
            .map(|(_, a)| a)
    }

    /// Accounts that are not validators.
    pub fn non_validators(&self) -> impl Iterator<Item = &SimAccount> {
        self.accounts
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.validator_indices.contains(i))
            .map(|(_, a)| a)
    }

    pub fn is_validator(&self, account: &SimAccount) -> bool {
        self.validators().any(|v| v.address == account.address)
    }

    pub fn chain_id(&self) -> String {
        self.chain.chain_id().to_string()
    }

    /// Advance `n` blocks.
    pub fn advance(&mut self, n: u64) {
        for _ in 0..n {
            self.chain.end_block();
        }
    }
}

pub struct TestNetworkBuilder {
    accounts: usize,
    validator_indices: BTreeSet<usize>,
    balance: u128,
    delegated: bool,
    contract_call: bool,
}

impl TestNetworkBuilder {
    fn new(accounts: usize) -> Self {
        Self {
            accounts,
            validator_indices: BTreeSet::new(),
            balance: DEFAULT_BALANCE,
            delegated: false,
            contract_call: false,
        }
    }

    /// Make the first `n` accounts validators.
    pub fn with_validators(mut self, n: usize) -> Self {
        self.validator_indices = (0..n).collect();
        self
    }

    /// Make the accounts at `indices` validators.
    pub fn with_validators_at(mut self, indices: &[usize]) -> Self {
        self.validator_indices = indices.iter().copied().collect();
        self
    }

    pub fn with_balance(mut self, balance: u128) -> Self {
        self.balance = balance;
        self
    }

    /// Every validator delegates its own address and Ethereum key at genesis.
    pub fn with_delegated_keys(mut self) -> Self {
        self.delegated = true;
        self
    }

    /// Seed one outgoing contract call.
    pub fn with_contract_call(mut self) -> Self {
        self.contract_call = true;
        self
    }

    pub fn build(self) -> TestNetwork {
        let accounts = test_accounts(self.accounts);
        let mut genesis = GenesisConfig::default();
        for account in &accounts {
            genesis = genesis.with_account(account.address, self.balance);
        }
        for &i in &self.validator_indices {
            let account = &accounts[i];
            genesis = genesis.with_validator(&account.address, 10 + i as u64);
            if self.delegated {
                genesis = genesis.with_delegation(
                    ValAddress::from(&account.address),
                    account.address,
                    account.eth_address,
                );
            }
        }
        if self.contract_call {
            genesis = genesis.with_contract_call(ContractCallTx {
                invalidation_nonce: 1,
                invalidation_scope: b"test-scope".to_vec(),
                address: EthAddress([0xcc; 20]),
                payload: vec![0x01, 0x02, 0x03],
                timeout: 10_000,
                tokens: vec![],
                fees: vec![],
                height: 1,
            });
        }

        TestNetwork {
            chain: SimChain::new(genesis).expect("test genesis is valid"),
            accounts,
            validator_indices: self.validator_indices,
        }
    }
}
