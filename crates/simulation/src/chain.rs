//! The simulated chain.

use crate::genesis::{GenesisConfig, GenesisError};
use crate::handlers::MsgContext;
use crate::state::ChainState;
use gravity_core::{DeliverError, DeliverResult, GravityKeeper, SimApp};
use gravity_types::{ContractCallTx, SignerSetTx, Tx};
use std::time::Duration;
use tracing::{debug, info, trace};

/// A single-node, in-memory Gravity chain.
///
/// Blocks are implicit: transactions delivered between two calls to
/// [`SimApp::end_block`] belong to the same block.
pub struct SimChain {
    chain_id: String,
    state: ChainState,
    height: u64,
    time: Duration,
    block_interval: Duration,
    delivered: u64,
    rejected: u64,
}

impl SimChain {
    /// Create a chain from `genesis` and run the genesis end-block.
    pub fn new(genesis: GenesisConfig) -> Result<Self, GenesisError> {
        let state = genesis.build_state()?;
        info!(
            chain_id = %genesis.chain_id,
            accounts = genesis.accounts.len(),
            validators = genesis.validators.len(),
            "Initialized simulated chain"
        );

        let mut chain = Self {
            chain_id: genesis.chain_id,
            state,
            height: 1,
            time: genesis.genesis_time,
            block_interval: genesis.block_interval,
            delivered: 0,
            rejected: 0,
        };
        chain.update_signer_set();
        Ok(chain)
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The live state (not a snapshot).
    pub fn current_state(&self) -> &ChainState {
        &self.state
    }

    /// Number of transactions that passed the transaction-level checks.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Number of transactions rejected before any message ran.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Register an outgoing contract call, as another module would.
    pub fn schedule_contract_call(&mut self, mut call: ContractCallTx) -> u64 {
        let nonce = self.state.next_contract_call_nonce;
        self.state.next_contract_call_nonce += 1;
        call.invalidation_nonce = nonce;
        call.height = self.height;
        self.state.contract_calls.insert(nonce, call);
        nonce
    }

    /// Create a new signer set when delegated validators or powers changed.
    fn update_signer_set(&mut self) {
        let signers = self.state.current_signers();
        if signers.is_empty() {
            return;
        }
        let latest = self.state.latest_signer_set_tx();
        if latest.as_ref().is_some_and(|s| s.same_members(&signers)) {
            return;
        }
        let nonce = latest.map_or(1, |s| s.nonce + 1);
        debug!(nonce, members = signers.len(), "Created signer set");
        self.state.signer_sets.insert(
            nonce,
            SignerSetTx {
                nonce,
                height: self.height,
                signers,
            },
        );
    }

    /// Transaction-level checks; on success charges the fee and bumps the sequence.
    fn ante(&mut self, tx: &Tx) -> Result<(), DeliverError> {
        if tx.chain_id != self.chain_id {
            return Err(DeliverError::WrongChainId {
                expected: self.chain_id.clone(),
                got: tx.chain_id.clone(),
            });
        }
        if tx.msgs.is_empty() {
            return Err(DeliverError::EmptyTx);
        }
        let sequence = *self
            .state
            .sequences
            .get(&tx.signer)
            .ok_or(DeliverError::UnknownAccount(tx.signer))?;
        if sequence != tx.sequence {
            return Err(DeliverError::SequenceMismatch {
                expected: sequence,
                got: tx.sequence,
            });
        }
        if let Some(msg) = tx.msgs.iter().find(|m| m.signer() != tx.signer) {
            return Err(DeliverError::Unauthorized(format!(
                "{} must be signed by {}",
                msg.type_url(),
                msg.signer()
            )));
        }
        tx.verify_signature()
            .map_err(|e| DeliverError::Unauthorized(e.to_string()))?;

        let balance = self.state.balances.get(&tx.signer).cloned().unwrap_or_default();
        let remaining = balance
            .checked_sub_all(&tx.fee)
            .ok_or_else(|| DeliverError::InsufficientFee(tx.fee.clone()))?;
        self.state.balances.insert(tx.signer, remaining);
        for coin in tx.fee.iter() {
            self.state.fee_pool.add(coin);
        }
        self.state.sequences.insert(tx.signer, sequence + 1);
        Ok(())
    }
}

impl SimApp for SimChain {
    type State = ChainState;

    fn state(&self) -> ChainState {
        self.state.clone()
    }

    fn block_time(&self) -> Duration {
        self.time
    }

    fn block_height(&self) -> u64 {
        self.height
    }

    fn deliver(&mut self, tx: Tx) -> Result<DeliverResult, DeliverError> {
        if let Err(e) = self.ante(&tx) {
            self.rejected += 1;
            debug!(signer = %tx.signer, error = %e, "Rejected transaction");
            return Err(e);
        }
        self.delivered += 1;

        let ctx = MsgContext {
            height: self.height,
            tx_sequence: tx.sequence,
        };
        let mut scratch = self.state.clone();
        let mut logs = Vec::with_capacity(tx.msgs.len());
        for msg in &tx.msgs {
            match scratch.handle(msg, &ctx) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    debug!(msg = msg.type_url(), error = %e, "Message failed");
                    return Ok(DeliverResult::rejected(e.to_string()));
                }
            }
        }
        self.state = scratch;
        Ok(DeliverResult::applied(logs.join("; ")))
    }

    /// Refresh the signer set, then advance height and time.
    fn end_block(&mut self) {
        self.update_signer_set();
        self.height += 1;
        self.time += self.block_interval;
        trace!(height = self.height, time = ?self.time, "Started block");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_core::{AccountKeeper, BankKeeper};
    use gravity_types::test_utils::test_accounts;
    use gravity_types::{
        new_ethereum_signature, Coin, Coins, DelegateKeysSignMsg, EthAddress, Hash, Msg,
        MsgDelegateKeys, MsgSendToEthereum, SimAccount, BOND_DENOM,
    };

    fn chain_with(accounts: &[SimAccount], validators: usize) -> SimChain {
        let mut genesis = GenesisConfig::default();
        for account in accounts {
            genesis = genesis.with_account(account.address, 10_000);
        }
        for account in accounts.iter().take(validators) {
            genesis = genesis.with_validator(&account.address, 10);
        }
        SimChain::new(genesis).unwrap()
    }

    fn send(account: &SimAccount, amount: u128, fee: u128) -> Msg {
        Msg::SendToEthereum(MsgSendToEthereum {
            sender: account.address,
            ethereum_recipient: EthAddress([9; 20]),
            amount: Coin::new(BOND_DENOM, amount),
            bridge_fee: Coin::new(BOND_DENOM, fee),
        })
    }

    fn delegate(chain: &SimChain, account: &SimAccount) -> Tx {
        let sequence = chain.state().sequence(&account.address).unwrap();
        let sign_bytes = DelegateKeysSignMsg::new(account.val_address(), sequence)
            .sign_bytes()
            .unwrap();
        let msg = Msg::DelegateKeys(MsgDelegateKeys {
            validator_address: account.val_address(),
            orchestrator_address: account.address,
            ethereum_address: account.eth_address,
            eth_signature: new_ethereum_signature(
                &Hash::from_bytes(&sign_bytes),
                &account.priv_key,
            ),
        });
        Tx::sign(chain.chain_id(), account, sequence, vec![msg], Coins::new()).unwrap()
    }

    #[test]
    fn test_deliver_bumps_sequence_and_escrows() {
        let accounts = test_accounts(2);
        let mut chain = chain_with(&accounts, 0);
        let tx = Tx::sign(
            chain.chain_id(),
            &accounts[0],
            0,
            vec![send(&accounts[0], 100, 5)],
            Coins::from(Coin::new(BOND_DENOM, 1)),
        )
        .unwrap();

        let result = chain.deliver(tx).unwrap();
        assert!(result.applied, "{}", result.log);

        let state = chain.state();
        assert_eq!(state.sequence(&accounts[0].address), Ok(1));
        assert_eq!(
            state.spendable_coin(&accounts[0].address, BOND_DENOM).amount,
            10_000 - 106
        );
        assert_eq!(state.module_escrow().amount_of(BOND_DENOM), 105);
        assert_eq!(state.unbatched_send_to_ethereums().len(), 1);
        assert_eq!(state.supply_of(BOND_DENOM), 20_000);
    }

    #[test]
    fn test_wrong_sequence_rejected() {
        let accounts = test_accounts(1);
        let mut chain = chain_with(&accounts, 0);
        let tx = Tx::sign(chain.chain_id(), &accounts[0], 3, vec![send(&accounts[0], 1, 0)], Coins::new())
            .unwrap();
        assert_eq!(
            chain.deliver(tx),
            Err(DeliverError::SequenceMismatch { expected: 0, got: 3 })
        );
        assert_eq!(chain.rejected_count(), 1);
    }

    #[test]
    fn test_failed_message_keeps_fee_and_sequence_only() {
        let accounts = test_accounts(1);
        let mut chain = chain_with(&accounts, 0);
        let tx = Tx::sign(
            chain.chain_id(),
            &accounts[0],
            0,
            vec![send(&accounts[0], 20_000, 0)],
            Coins::from(Coin::new(BOND_DENOM, 2)),
        )
        .unwrap();

        let result = chain.deliver(tx).unwrap();
        assert!(!result.applied);
        let state = chain.state();
        assert_eq!(state.sequence(&accounts[0].address), Ok(1));
        assert_eq!(state.spendable_coin(&accounts[0].address, BOND_DENOM).amount, 9_998);
        assert!(state.unbatched_send_to_ethereums().is_empty());
    }

    #[test]
    fn test_delegation_creates_signer_set() {
        let accounts = test_accounts(3);
        let mut chain = chain_with(&accounts, 2);
        assert!(chain.state().latest_signer_set_tx().is_none());

        let result = chain.deliver(delegate(&chain, &accounts[0])).unwrap();
        assert!(result.applied, "{}", result.log);
        chain.end_block();

        let set = chain.state().latest_signer_set_tx().unwrap();
        assert_eq!(set.nonce, 1);
        assert_eq!(set.signers[0].ethereum_address, accounts[0].eth_address);

        // Unchanged membership does not create a new set.
        chain.end_block();
        assert_eq!(chain.state().latest_signer_set_tx().unwrap().nonce, 1);

        chain.deliver(delegate(&chain, &accounts[1])).unwrap();
        chain.end_block();
        assert_eq!(chain.state().latest_signer_set_tx().unwrap().signers.len(), 2);
    }

    #[test]
    fn test_delegation_with_stale_nonce_fails() {
        let accounts = test_accounts(1);
        let mut chain = chain_with(&accounts, 1);
        let mut tx = delegate(&chain, &accounts[0]);
        // Burn sequence 0 so the signed nonce no longer matches.
        let filler = Tx::sign(chain.chain_id(), &accounts[0], 0, vec![send(&accounts[0], 1, 0)], Coins::new())
            .unwrap();
        chain.deliver(filler).unwrap();
        tx = Tx::sign(chain.chain_id(), &accounts[0], 1, tx.msgs, Coins::new()).unwrap();

        let result = chain.deliver(tx).unwrap();
        assert!(!result.applied);
    }

    #[test]
    fn test_snapshot_not_updated_by_delivery() {
        let accounts = test_accounts(1);
        let mut chain = chain_with(&accounts, 0);
        let before = chain.state();
        let tx = Tx::sign(chain.chain_id(), &accounts[0], 0, vec![send(&accounts[0], 1, 0)], Coins::new())
            .unwrap();
        chain.deliver(tx).unwrap();
        assert_eq!(before.sequence(&accounts[0].address), Ok(0));
        assert_eq!(chain.state().sequence(&accounts[0].address), Ok(1));
    }
}
