//! Gravity message handlers.
//!
//! Handlers mutate a scratch copy of [`ChainState`]; the chain commits the
//! copy only when the handler succeeds.

use crate::state::{ChainState, OutgoingTxKey};
use gravity_types::{
    validate_ethereum_signature, AccAddress, BatchTx, Coin, DelegateKeysSignMsg, EthAddress,
    Erc20Token, EthereumEvent, EthereumTxConfirmation, Hash, Msg, MsgCancelSendToEthereum,
    MsgDelegateKeys, MsgError, MsgEthereumHeightVote, MsgRequestBatchTx, MsgSendToEthereum,
    MsgSubmitEthereumEvent, MsgSubmitEthereumTxConfirmation, OutgoingTx, SendToEthereum,
    SigningError, ValAddress,
};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Invalid(#[from] MsgError),

    #[error("validator {0} not found")]
    ValidatorNotFound(ValAddress),

    #[error("{0} is not an orchestrator or validator")]
    NotOrchestrator(AccAddress),

    #[error("orchestrator {0} already in use")]
    OrchestratorInUse(AccAddress),

    #[error("ethereum address {0} already in use")]
    EthereumAddressInUse(EthAddress),

    #[error("validator {0} has not delegated an ethereum key")]
    NoEthereumKey(ValAddress),

    #[error("confirmation signed by {got}, expected delegated key {expected}")]
    EthereumSignerMismatch { expected: EthAddress, got: EthAddress },

    #[error("no outgoing tx matches {0:?}")]
    UnknownOutgoingTx(OutgoingTxKey),

    #[error("validator {0} already confirmed {1:?}")]
    DuplicateConfirmation(ValAddress, OutgoingTxKey),

    #[error("invalid ethereum signature: {0}")]
    InvalidSignature(#[from] SigningError),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("non contiguous event nonce: expected {expected}, got {got}")]
    NonContiguousEventNonce { expected: u64, got: u64 },

    #[error("insufficient funds: {address} cannot spend {needed}")]
    InsufficientFunds { address: AccAddress, needed: Coin },

    #[error("denom {0} is not bridged")]
    DenomNotBridged(String),

    #[error("no unbatched transfers for {0}")]
    NothingToBatch(String),

    #[error("no unbatched transfer with id {0}")]
    UnknownTransfer(u64),

    #[error("{0} did not send transfer {1}")]
    NotTransferSender(AccAddress, u64),
}

/// Block and transaction facts a handler may need.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MsgContext {
    pub height: u64,
    /// Sequence the enclosing transaction was signed with.
    pub tx_sequence: u64,
}

impl ChainState {
    pub(crate) fn handle(&mut self, msg: &Msg, ctx: &MsgContext) -> Result<String, HandlerError> {
        msg.validate_basic()?;
        match msg {
            Msg::DelegateKeys(m) => self.delegate_keys(m, ctx),
            Msg::SubmitEthereumTxConfirmation(m) => self.submit_confirmation(m),
            Msg::SubmitEthereumEvent(m) => self.submit_event(m),
            Msg::SendToEthereum(m) => self.send_to_ethereum(m),
            Msg::RequestBatchTx(m) => self.request_batch(m, ctx),
            Msg::CancelSendToEthereum(m) => self.cancel_send_to_ethereum(m),
            Msg::EthereumHeightVote(m) => self.ethereum_height_vote(m),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Bank helpers
    // ═══════════════════════════════════════════════════════════════════════

    pub(crate) fn debit(&mut self, address: &AccAddress, coin: &Coin) -> Result<(), HandlerError> {
        if coin.is_zero() {
            return Ok(());
        }
        let balance = self.balances.get(address).cloned().unwrap_or_default();
        let remaining = balance
            .checked_sub(coin)
            .ok_or_else(|| HandlerError::InsufficientFunds {
                address: *address,
                needed: coin.clone(),
            })?;
        self.balances.insert(*address, remaining);
        Ok(())
    }

    pub(crate) fn credit(&mut self, address: &AccAddress, coin: &Coin) {
        if !self.sequences.contains_key(address) {
            self.sequences.insert(*address, 0);
        }
        let mut balance = self.balances.get(address).cloned().unwrap_or_default();
        balance.add(coin);
        self.balances.insert(*address, balance);
    }

    fn release_from_escrow(&mut self, coin: &Coin) {
        if let Some(rest) = self.module_escrow.checked_sub(coin) {
            self.module_escrow = rest;
        }
    }

    fn signer_validator(&self, signer: &AccAddress) -> Result<ValAddress, HandlerError> {
        self.validator_for_signer(signer)
            .ok_or(HandlerError::NotOrchestrator(*signer))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Key delegation
    // ═══════════════════════════════════════════════════════════════════════

    fn delegate_keys(&mut self, m: &MsgDelegateKeys, ctx: &MsgContext) -> Result<String, HandlerError> {
        let val = m.validator_address;
        if !self.validators.contains_key(&val) {
            return Err(HandlerError::ValidatorNotFound(val));
        }
        if let Some(other) = self.orchestrators.get(&m.orchestrator_address) {
            if *other != val {
                return Err(HandlerError::OrchestratorInUse(m.orchestrator_address));
            }
        }
        if self
            .ethereum_addresses
            .iter()
            .any(|(v, e)| *e == m.ethereum_address && *v != val)
        {
            return Err(HandlerError::EthereumAddressInUse(m.ethereum_address));
        }

        let sign_bytes = DelegateKeysSignMsg::new(val, ctx.tx_sequence)
            .sign_bytes()
            .map_err(|e| HandlerError::Encoding(e.to_string()))?;
        validate_ethereum_signature(
            &Hash::from_bytes(&sign_bytes),
            &m.eth_signature,
            &m.ethereum_address,
        )?;

        let stale: Vec<AccAddress> = self
            .orchestrators
            .iter()
            .filter(|(_, v)| **v == val)
            .map(|(o, _)| *o)
            .collect();
        for orchestrator in stale {
            self.orchestrators.remove(&orchestrator);
        }
        self.orchestrators.insert(m.orchestrator_address, val);
        self.ethereum_addresses.insert(val, m.ethereum_address);
        if !self.sequences.contains_key(&m.orchestrator_address) {
            self.sequences.insert(m.orchestrator_address, 0);
        }

        debug!(validator = %val, ethereum = %m.ethereum_address, "Delegated keys");
        Ok(format!("delegated {} to {}", val, m.ethereum_address))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Confirmations
    // ═══════════════════════════════════════════════════════════════════════

    fn submit_confirmation(
        &mut self,
        m: &MsgSubmitEthereumTxConfirmation,
    ) -> Result<String, HandlerError> {
        let val = self.signer_validator(&m.signer)?;
        let delegated = *self
            .ethereum_addresses
            .get(&val)
            .ok_or(HandlerError::NoEthereumKey(val))?;
        if *m.confirmation.ethereum_signer() != delegated {
            return Err(HandlerError::EthereumSignerMismatch {
                expected: delegated,
                got: *m.confirmation.ethereum_signer(),
            });
        }

        let gravity_id = self.params.gravity_id.clone();
        let (key, checkpoint) = match &m.confirmation {
            EthereumTxConfirmation::SignerSetTx(c) => {
                let key = OutgoingTxKey::SignerSet(c.signer_set_nonce);
                let tx = self
                    .signer_sets
                    .get(&c.signer_set_nonce)
                    .ok_or_else(|| HandlerError::UnknownOutgoingTx(key.clone()))?;
                (key, tx.checkpoint(gravity_id.as_bytes()))
            }
            EthereumTxConfirmation::BatchTx(c) => {
                let key = OutgoingTxKey::Batch(c.token_contract, c.batch_nonce);
                let tx = self
                    .batches
                    .get(&c.batch_nonce)
                    .filter(|b| b.token_contract == c.token_contract)
                    .ok_or_else(|| HandlerError::UnknownOutgoingTx(key.clone()))?;
                (key, tx.checkpoint(gravity_id.as_bytes()))
            }
            EthereumTxConfirmation::ContractCallTx(c) => {
                let key =
                    OutgoingTxKey::ContractCall(c.invalidation_scope.clone(), c.invalidation_nonce);
                let tx = self
                    .contract_calls
                    .get(&c.invalidation_nonce)
                    .filter(|call| call.invalidation_scope == c.invalidation_scope)
                    .ok_or_else(|| HandlerError::UnknownOutgoingTx(key.clone()))?;
                (key, tx.checkpoint(gravity_id.as_bytes()))
            }
        };

        validate_ethereum_signature(&checkpoint, m.confirmation.signature(), &delegated)?;

        let entry = (key.clone(), val);
        if self.confirmations.contains_key(&entry) {
            return Err(HandlerError::DuplicateConfirmation(val, key));
        }
        self.confirmations
            .insert(entry, m.confirmation.signature().clone());

        trace!(validator = %val, ?key, "Stored confirmation");
        Ok(format!("confirmed {:?}", key))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ethereum events
    // ═══════════════════════════════════════════════════════════════════════

    fn submit_event(&mut self, m: &MsgSubmitEthereumEvent) -> Result<String, HandlerError> {
        let val = self.signer_validator(&m.signer)?;
        let last = self.last_event_nonces.get(&val).copied().unwrap_or(0);
        let nonce = m.event.event_nonce();
        if nonce != last + 1 {
            return Err(HandlerError::NonContiguousEventNonce {
                expected: last + 1,
                got: nonce,
            });
        }
        self.last_event_nonces.insert(val, nonce);

        // The first report of a nonce is the one that takes effect.
        if nonce <= self.last_observed_event_nonce {
            return Ok(format!("event {} already observed", nonce));
        }
        self.last_observed_event_nonce = nonce;
        self.last_observed_ethereum_height = self
            .last_observed_ethereum_height
            .max(m.event.ethereum_height());

        let log = self.apply_event(&m.event);
        debug!(validator = %val, nonce, %log, "Observed ethereum event");
        Ok(log)
    }

    fn apply_event(&mut self, event: &EthereumEvent) -> String {
        match event {
            EthereumEvent::SendToCosmos(e) => {
                let denom = self
                    .denom_by_erc20
                    .get(&e.token_contract)
                    .cloned()
                    .unwrap_or_else(|| format!("gravity0x{}", e.token_contract.to_lower_hex()));
                let coin = Coin::new(denom, e.amount);
                if self.module_escrow.amount_of(&coin.denom) >= coin.amount {
                    self.release_from_escrow(&coin);
                }
                self.credit(&e.cosmos_receiver, &coin);
                format!("sent {} to {}", coin, e.cosmos_receiver)
            }
            EthereumEvent::BatchExecuted(e) => {
                let executed: Vec<u64> = self
                    .batches
                    .iter()
                    .filter(|(_, b)| b.token_contract == e.token_contract && b.batch_nonce <= e.batch_nonce)
                    .map(|(n, _)| *n)
                    .collect();
                for nonce in executed {
                    let Some(batch) = self.batches.remove(&nonce) else {
                        continue;
                    };
                    if nonce == e.batch_nonce {
                        self.burn_batch(&batch);
                    } else {
                        // Older batches of the same token can no longer execute.
                        for tx in batch.transactions {
                            self.unbatched.insert(tx.id, tx);
                        }
                    }
                }
                format!("batch {} executed", e.batch_nonce)
            }
            EthereumEvent::ContractCallExecuted(e) => {
                let matches = self
                    .contract_calls
                    .get(&e.invalidation_nonce)
                    .is_some_and(|c| c.invalidation_scope == e.invalidation_scope);
                if matches {
                    self.contract_calls.remove(&e.invalidation_nonce);
                }
                format!("contract call {} executed", e.invalidation_nonce)
            }
            EthereumEvent::Erc20Deployed(e) => {
                if self.erc20_by_denom.contains_key(&e.cosmos_denom)
                    || self.denom_by_erc20.contains_key(&e.token_contract)
                {
                    return format!("erc20 for {} already mapped", e.cosmos_denom);
                }
                self.erc20_by_denom
                    .insert(e.cosmos_denom.clone(), e.token_contract);
                self.denom_by_erc20
                    .insert(e.token_contract, e.cosmos_denom.clone());
                format!("mapped {} to {}", e.cosmos_denom, e.token_contract)
            }
            EthereumEvent::SignerSetTxExecuted(e) => {
                let pruned: Vec<u64> = self
                    .signer_sets
                    .keys()
                    .filter(|n| **n < e.signer_set_tx_nonce)
                    .copied()
                    .collect();
                for nonce in pruned {
                    self.signer_sets.remove(&nonce);
                }
                format!("signer set {} executed", e.signer_set_tx_nonce)
            }
        }
    }

    fn burn_batch(&mut self, batch: &BatchTx) {
        for tx in &batch.transactions {
            if let Some(denom) = self.denom_by_erc20.get(&tx.erc20_token.contract).cloned() {
                let total = tx.erc20_token.amount + tx.erc20_fee.amount;
                self.release_from_escrow(&Coin::new(denom, total));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transfers to Ethereum
    // ═══════════════════════════════════════════════════════════════════════

    fn send_to_ethereum(&mut self, m: &MsgSendToEthereum) -> Result<String, HandlerError> {
        let contract = *self
            .erc20_by_denom
            .get(&m.amount.denom)
            .ok_or_else(|| HandlerError::DenomNotBridged(m.amount.denom.clone()))?;
        let total = Coin::new(m.amount.denom.clone(), m.amount.amount + m.bridge_fee.amount);
        self.debit(&m.sender, &total)?;
        self.module_escrow.add(&total);

        let id = self.next_send_id;
        self.next_send_id += 1;
        self.unbatched.insert(
            id,
            SendToEthereum {
                id,
                sender: m.sender,
                ethereum_recipient: m.ethereum_recipient,
                erc20_token: Erc20Token {
                    contract,
                    amount: m.amount.amount,
                },
                erc20_fee: Erc20Token {
                    contract,
                    amount: m.bridge_fee.amount,
                },
            },
        );
        trace!(id, sender = %m.sender, amount = %m.amount, "Queued send to ethereum");
        Ok(format!("send to ethereum {}", id))
    }

    fn request_batch(&mut self, m: &MsgRequestBatchTx, ctx: &MsgContext) -> Result<String, HandlerError> {
        let contract = *self
            .erc20_by_denom
            .get(&m.denom)
            .ok_or_else(|| HandlerError::DenomNotBridged(m.denom.clone()))?;

        let mut candidates: Vec<SendToEthereum> = self
            .unbatched
            .values()
            .filter(|tx| tx.erc20_token.contract == contract)
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Err(HandlerError::NothingToBatch(m.denom.clone()));
        }
        candidates.sort_by(|a, b| {
            b.erc20_fee
                .amount
                .cmp(&a.erc20_fee.amount)
                .then(a.id.cmp(&b.id))
        });
        candidates.truncate(self.params.batch_size.max(1));

        for tx in &candidates {
            self.unbatched.remove(&tx.id);
        }
        let batch_nonce = self.next_batch_nonce;
        self.next_batch_nonce += 1;
        let size = candidates.len();
        self.batches.insert(
            batch_nonce,
            BatchTx {
                batch_nonce,
                timeout: self.last_observed_ethereum_height + self.params.target_eth_tx_timeout,
                transactions: candidates,
                token_contract: contract,
                height: ctx.height,
            },
        );
        debug!(batch_nonce, size, denom = %m.denom, "Built batch");
        Ok(format!("batch {} with {} transfers", batch_nonce, size))
    }

    fn cancel_send_to_ethereum(&mut self, m: &MsgCancelSendToEthereum) -> Result<String, HandlerError> {
        let tx = self
            .unbatched
            .get(&m.id)
            .cloned()
            .ok_or(HandlerError::UnknownTransfer(m.id))?;
        if tx.sender != m.sender {
            return Err(HandlerError::NotTransferSender(m.sender, m.id));
        }
        let denom = self
            .denom_by_erc20
            .get(&tx.erc20_token.contract)
            .cloned()
            .ok_or_else(|| HandlerError::DenomNotBridged(tx.erc20_token.contract.to_string()))?;
        let refund = Coin::new(denom, tx.erc20_token.amount + tx.erc20_fee.amount);
        self.release_from_escrow(&refund);
        self.credit(&tx.sender, &refund);
        self.unbatched.remove(&m.id);
        Ok(format!("cancelled send to ethereum {}", m.id))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Height votes
    // ═══════════════════════════════════════════════════════════════════════

    fn ethereum_height_vote(&mut self, m: &MsgEthereumHeightVote) -> Result<String, HandlerError> {
        let val = self.signer_validator(&m.signer)?;
        self.height_votes.insert(val, m.ethereum_height);

        // Highest height that two thirds of the voting power has reached.
        let total_power: u64 = self
            .validators
            .values()
            .filter(|v| !v.jailed)
            .map(|v| v.power)
            .sum();
        let mut votes: Vec<(u64, u64)> = self
            .height_votes
            .iter()
            .filter_map(|(v, h)| {
                self.validators
                    .get(v)
                    .filter(|v| !v.jailed)
                    .map(|v| (*h, v.power))
            })
            .collect();
        votes.sort_by(|a, b| b.0.cmp(&a.0));

        let mut power = 0u64;
        for (height, vote_power) in votes {
            power += vote_power;
            if power * 3 >= total_power * 2 {
                self.last_observed_ethereum_height = self.last_observed_ethereum_height.max(height);
                break;
            }
        }
        Ok(format!("height vote {} by {}", m.ethereum_height, val))
    }
}
