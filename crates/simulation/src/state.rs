//! Chain state backed by persistent maps.
//!
//! Every map is an `im::OrdMap`, so cloning a [`ChainState`] is O(1) and
//! iteration order is deterministic.

use gravity_core::{AccountKeeper, BankKeeper, GravityKeeper, KeeperError, StakingKeeper};
use gravity_types::{
    AccAddress, BatchTx, Coins, ContractCallTx, EthAddress, EthSignature, EthereumSigner, Params,
    SendToEthereum, SignerSetTx, ValAddress, Validator,
};
use im::OrdMap;

/// Where a confirmation is stored: the outgoing tx it signs and the validator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutgoingTxKey {
    SignerSet(u64),
    Batch(EthAddress, u64),
    ContractCall(Vec<u8>, u64),
}

/// Snapshot of the whole simulated chain.
#[derive(Debug, Clone, Default)]
pub struct ChainState {
    pub(crate) params: Params,

    // Auth and bank
    pub(crate) sequences: OrdMap<AccAddress, u64>,
    pub(crate) balances: OrdMap<AccAddress, Coins>,
    pub(crate) module_escrow: Coins,
    pub(crate) fee_pool: Coins,

    // Staking
    pub(crate) validators: OrdMap<ValAddress, Validator>,

    // Key delegation
    pub(crate) orchestrators: OrdMap<AccAddress, ValAddress>,
    pub(crate) ethereum_addresses: OrdMap<ValAddress, EthAddress>,

    // Outgoing
    pub(crate) signer_sets: OrdMap<u64, SignerSetTx>,
    pub(crate) batches: OrdMap<u64, BatchTx>,
    pub(crate) contract_calls: OrdMap<u64, ContractCallTx>,
    pub(crate) confirmations: OrdMap<(OutgoingTxKey, ValAddress), EthSignature>,
    pub(crate) unbatched: OrdMap<u64, SendToEthereum>,
    pub(crate) next_send_id: u64,
    pub(crate) next_batch_nonce: u64,
    pub(crate) next_contract_call_nonce: u64,

    // Incoming
    pub(crate) last_event_nonces: OrdMap<ValAddress, u64>,
    pub(crate) last_observed_event_nonce: u64,
    pub(crate) height_votes: OrdMap<ValAddress, u64>,
    pub(crate) last_observed_ethereum_height: u64,

    // Token mapping
    pub(crate) erc20_by_denom: OrdMap<String, EthAddress>,
    pub(crate) denom_by_erc20: OrdMap<EthAddress, String>,
}

impl ChainState {
    /// The validator an orchestrator (or a validator's own account) acts for.
    pub fn validator_for_signer(&self, signer: &AccAddress) -> Option<ValAddress> {
        if let Some(val) = self.orchestrators.get(signer) {
            return Some(*val);
        }
        let own = ValAddress::from(signer);
        self.validators.contains_key(&own).then_some(own)
    }

    /// The signer set the current validator set and delegations imply.
    ///
    /// Ordered by power, then address, highest first. Jailed validators and
    /// validators without an Ethereum key are excluded.
    pub fn current_signers(&self) -> Vec<EthereumSigner> {
        let mut signers: Vec<EthereumSigner> = self
            .validators
            .values()
            .filter(|v| !v.jailed && v.power > 0)
            .filter_map(|v| {
                self.ethereum_addresses
                    .get(&v.operator)
                    .map(|eth| EthereumSigner {
                        power: v.power,
                        ethereum_address: *eth,
                    })
            })
            .collect();
        signers.sort_by(|a, b| {
            b.power
                .cmp(&a.power)
                .then_with(|| b.ethereum_address.cmp(&a.ethereum_address))
        });
        signers
    }

    /// Number of stored confirmations for `key`.
    pub fn confirmation_count(&self, key: &OutgoingTxKey) -> usize {
        self.confirmations.keys().filter(|(k, _)| k == key).count()
    }

    pub fn confirmation(&self, key: &OutgoingTxKey, validator: &ValAddress) -> Option<&EthSignature> {
        self.confirmations.get(&(key.clone(), *validator))
    }

    pub fn height_vote(&self, validator: &ValAddress) -> Option<u64> {
        self.height_votes.get(validator).copied()
    }

    pub fn last_observed_event_nonce(&self) -> u64 {
        self.last_observed_event_nonce
    }

    pub fn orchestrator_validator(&self, orchestrator: &AccAddress) -> Option<ValAddress> {
        self.orchestrators.get(orchestrator).copied()
    }

    /// All stored signer sets, oldest first.
    pub fn signer_sets(&self) -> impl Iterator<Item = &SignerSetTx> {
        self.signer_sets.values()
    }

    /// All pending batches, oldest first.
    pub fn batches(&self) -> impl Iterator<Item = &BatchTx> {
        self.batches.values()
    }

    pub fn contract_calls(&self) -> impl Iterator<Item = &ContractCallTx> {
        self.contract_calls.values()
    }

    pub fn module_escrow(&self) -> &Coins {
        &self.module_escrow
    }

    pub fn fee_pool(&self) -> &Coins {
        &self.fee_pool
    }

    pub fn validators(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }

    /// Total supply of `denom` across accounts, escrow and fee pool.
    pub fn supply_of(&self, denom: &str) -> u128 {
        self.balances
            .values()
            .map(|c| c.amount_of(denom))
            .sum::<u128>()
            + self.module_escrow.amount_of(denom)
            + self.fee_pool.amount_of(denom)
    }
}

impl AccountKeeper for ChainState {
    fn sequence(&self, address: &AccAddress) -> Result<u64, KeeperError> {
        self.sequences
            .get(address)
            .copied()
            .ok_or(KeeperError::AccountNotFound(*address))
    }
}

impl BankKeeper for ChainState {
    fn spendable_coins(&self, address: &AccAddress) -> Coins {
        self.balances.get(address).cloned().unwrap_or_default()
    }
}

impl StakingKeeper for ChainState {
    fn validator(&self, operator: &ValAddress) -> Option<Validator> {
        self.validators.get(operator).cloned()
    }
}

impl GravityKeeper for ChainState {
    fn params(&self) -> Result<Params, KeeperError> {
        if self.params.gravity_id.is_empty() {
            return Err(KeeperError::ParamsNotSet);
        }
        Ok(self.params.clone())
    }

    fn latest_signer_set_tx(&self) -> Option<SignerSetTx> {
        self.signer_sets.get_max().map(|(_, tx)| tx.clone())
    }

    fn latest_batch_tx(&self) -> Option<BatchTx> {
        self.batches.get_max().map(|(_, tx)| tx.clone())
    }

    fn latest_contract_call_tx(&self) -> Option<ContractCallTx> {
        self.contract_calls.get_max().map(|(_, tx)| tx.clone())
    }

    fn unbatched_send_to_ethereums(&self) -> Vec<SendToEthereum> {
        self.unbatched.values().cloned().collect()
    }

    fn last_event_nonce_by_validator(&self, operator: &ValAddress) -> u64 {
        self.last_event_nonces.get(operator).copied().unwrap_or(0)
    }

    fn last_observed_ethereum_height(&self) -> u64 {
        self.last_observed_ethereum_height
    }

    fn ethereum_address_by_validator(&self, operator: &ValAddress) -> Option<EthAddress> {
        self.ethereum_addresses.get(operator).copied()
    }

    fn erc20_for_denom(&self, denom: &str) -> Option<EthAddress> {
        self.erc20_by_denom.get(denom).copied()
    }

    fn denom_for_erc20(&self, contract: &EthAddress) -> Option<String> {
        self.denom_by_erc20.get(contract).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(byte: u8, power: u64) -> Validator {
        Validator {
            operator: ValAddress([byte; 20]),
            power,
            jailed: false,
        }
    }

    #[test]
    fn test_current_signers_requires_delegation() {
        let mut state = ChainState::default();
        state.validators.insert(ValAddress([1; 20]), validator(1, 10));
        state.validators.insert(ValAddress([2; 20]), validator(2, 30));
        assert!(state.current_signers().is_empty());

        state
            .ethereum_addresses
            .insert(ValAddress([1; 20]), EthAddress([0x11; 20]));
        state
            .ethereum_addresses
            .insert(ValAddress([2; 20]), EthAddress([0x22; 20]));
        let signers = state.current_signers();
        assert_eq!(signers.len(), 2);
        assert_eq!(signers[0].power, 30);
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let mut state = ChainState::default();
        state.sequences.insert(AccAddress([1; 20]), 0);
        let snapshot = state.clone();
        state.sequences.insert(AccAddress([1; 20]), 5);
        assert_eq!(snapshot.sequence(&AccAddress([1; 20])), Ok(0));
        assert_eq!(state.sequence(&AccAddress([1; 20])), Ok(5));
    }

    #[test]
    fn test_validator_for_signer() {
        let mut state = ChainState::default();
        let own = AccAddress([3; 20]);
        state.validators.insert(ValAddress([3; 20]), validator(3, 1));
        assert_eq!(state.validator_for_signer(&own), Some(ValAddress([3; 20])));

        let orchestrator = AccAddress([9; 20]);
        assert_eq!(state.validator_for_signer(&orchestrator), None);
        state.orchestrators.insert(orchestrator, ValAddress([3; 20]));
        assert_eq!(
            state.validator_for_signer(&orchestrator),
            Some(ValAddress([3; 20]))
        );
    }

    #[test]
    fn test_missing_account_is_an_error() {
        let state = ChainState::default();
        assert_eq!(
            state.sequence(&AccAddress([7; 20])),
            Err(KeeperError::AccountNotFound(AccAddress([7; 20])))
        );
    }
}
