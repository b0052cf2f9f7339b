//! Genesis configuration.

use crate::state::ChainState;
use gravity_types::{
    AccAddress, Coin, Coins, ContractCallTx, EthAddress, Params, ValAddress, Validator,
    BOND_DENOM,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisError {
    #[error("duplicate genesis account {0}")]
    DuplicateAccount(AccAddress),

    #[error("invalid genesis balance for {0}: {1}")]
    InvalidBalance(AccAddress, Coins),

    #[error("validator {0} has no genesis account")]
    ValidatorWithoutAccount(ValAddress),

    #[error("denom {0} mapped to more than one ERC20 contract")]
    DuplicateErc20(String),

    #[error("empty gravity id")]
    EmptyGravityId,
}

/// A pre-funded account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAccount {
    pub address: AccAddress,
    pub balance: Coins,
}

/// Keys a validator delegated before genesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisDelegation {
    pub validator: ValAddress,
    pub orchestrator: AccAddress,
    pub ethereum_address: EthAddress,
}

/// Configuration for a fresh chain.
#[derive(Debug, Clone)]
pub struct GenesisConfig {
    pub chain_id: String,
    pub params: Params,
    pub accounts: Vec<GenesisAccount>,
    pub validators: Vec<Validator>,
    pub delegations: Vec<GenesisDelegation>,
    /// `(denom, contract)` pairs bridged at genesis.
    pub erc20_tokens: Vec<(String, EthAddress)>,
    pub contract_calls: Vec<ContractCallTx>,
    pub genesis_time: Duration,
    /// Time between consecutive blocks.
    pub block_interval: Duration,
}

impl GenesisConfig {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            params: Params::default(),
            accounts: Vec::new(),
            validators: Vec::new(),
            delegations: Vec::new(),
            erc20_tokens: vec![(BOND_DENOM.to_string(), EthAddress([0x5e; 20]))],
            contract_calls: Vec::new(),
            genesis_time: Duration::from_secs(1_600_000_000),
            block_interval: Duration::from_secs(5),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Add an account holding `amount` of the bond denom.
    pub fn with_account(mut self, address: AccAddress, amount: u128) -> Self {
        self.accounts.push(GenesisAccount {
            address,
            balance: Coins::from(Coin::new(BOND_DENOM, amount)),
        });
        self
    }

    pub fn with_account_balance(mut self, address: AccAddress, balance: Coins) -> Self {
        self.accounts.push(GenesisAccount { address, balance });
        self
    }

    /// Make the account at `address` a validator with `power`.
    pub fn with_validator(mut self, address: &AccAddress, power: u64) -> Self {
        self.validators.push(Validator {
            operator: ValAddress::from(address),
            power,
            jailed: false,
        });
        self
    }

    pub fn with_delegation(
        mut self,
        validator: ValAddress,
        orchestrator: AccAddress,
        ethereum_address: EthAddress,
    ) -> Self {
        self.delegations.push(GenesisDelegation {
            validator,
            orchestrator,
            ethereum_address,
        });
        self
    }

    pub fn with_erc20(mut self, denom: impl Into<String>, contract: EthAddress) -> Self {
        self.erc20_tokens.push((denom.into(), contract));
        self
    }

    pub fn with_contract_call(mut self, call: ContractCallTx) -> Self {
        self.contract_calls.push(call);
        self
    }

    pub fn with_genesis_time(mut self, time: Duration) -> Self {
        self.genesis_time = time;
        self
    }

    pub fn with_block_interval(mut self, interval: Duration) -> Self {
        self.block_interval = interval;
        self
    }

    /// Build the initial state.
    pub(crate) fn build_state(&self) -> Result<ChainState, GenesisError> {
        if self.params.gravity_id.is_empty() {
            return Err(GenesisError::EmptyGravityId);
        }

        let mut state = ChainState {
            params: self.params.clone(),
            next_send_id: 1,
            next_batch_nonce: 1,
            next_contract_call_nonce: 1,
            ..ChainState::default()
        };

        for account in &self.accounts {
            if state.sequences.contains_key(&account.address) {
                return Err(GenesisError::DuplicateAccount(account.address));
            }
            if !account.balance.is_valid() {
                return Err(GenesisError::InvalidBalance(
                    account.address,
                    account.balance.clone(),
                ));
            }
            state.sequences.insert(account.address, 0);
            state
                .balances
                .insert(account.address, account.balance.clone());
        }

        for validator in &self.validators {
            if !state.sequences.contains_key(&validator.operator.account()) {
                return Err(GenesisError::ValidatorWithoutAccount(validator.operator));
            }
            state
                .validators
                .insert(validator.operator, validator.clone());
        }

        for delegation in &self.delegations {
            state
                .orchestrators
                .insert(delegation.orchestrator, delegation.validator);
            state
                .ethereum_addresses
                .insert(delegation.validator, delegation.ethereum_address);
        }

        for (denom, contract) in &self.erc20_tokens {
            if state.erc20_by_denom.contains_key(denom) {
                return Err(GenesisError::DuplicateErc20(denom.clone()));
            }
            state.erc20_by_denom.insert(denom.clone(), *contract);
            state.denom_by_erc20.insert(*contract, denom.clone());
        }

        for call in &self.contract_calls {
            state.contract_calls.insert(call.invalidation_nonce, call.clone());
            state.next_contract_call_nonce = state
                .next_contract_call_nonce
                .max(call.invalidation_nonce + 1);
        }

        Ok(state)
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self::new("gravity-sim-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_core::{AccountKeeper, BankKeeper, GravityKeeper};

    #[test]
    fn test_build_state() {
        let alice = AccAddress([1; 20]);
        let state = GenesisConfig::default()
            .with_account(alice, 1000)
            .with_validator(&alice, 10)
            .build_state()
            .unwrap();

        assert_eq!(state.sequence(&alice), Ok(0));
        assert_eq!(state.spendable_coin(&alice, BOND_DENOM).amount, 1000);
        assert!(state.validators.contains_key(&ValAddress::from(&alice)));
        assert!(state.erc20_for_denom(BOND_DENOM).is_some());
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let alice = AccAddress([1; 20]);
        let err = GenesisConfig::default()
            .with_account(alice, 1)
            .with_account(alice, 2)
            .build_state()
            .unwrap_err();
        assert_eq!(err, GenesisError::DuplicateAccount(alice));
    }

    #[test]
    fn test_validator_needs_account() {
        let err = GenesisConfig::default()
            .with_validator(&AccAddress([2; 20]), 1)
            .build_state()
            .unwrap_err();
        assert!(matches!(err, GenesisError::ValidatorWithoutAccount(_)));
    }
}
