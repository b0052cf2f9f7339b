//! Message handler behaviour through full transaction delivery.

use gravity_core::{AccountKeeper, BankKeeper, GravityKeeper, SimApp};
use gravity_simulation::{GenesisConfig, OutgoingTxKey, SimChain};
use gravity_types::test_utils::test_accounts;
use gravity_types::{
    new_ethereum_signature, BatchTxConfirmation, Coin, Coins, ContractCallTx,
    ContractCallTxConfirmation, DelegateKeysSignMsg, EthAddress, EthereumEvent,
    EthereumTxConfirmation, Hash, Msg, MsgCancelSendToEthereum, MsgDelegateKeys,
    MsgEthereumHeightVote, MsgRequestBatchTx, MsgSendToEthereum, MsgSubmitEthereumEvent,
    MsgSubmitEthereumTxConfirmation, OutgoingTx, SendToCosmosEvent, SignerSetTxConfirmation,
    SimAccount, BOND_DENOM,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_test::traced_test;

struct Harness {
    chain: SimChain,
    accounts: Vec<SimAccount>,
}

impl Harness {
    /// `n` funded accounts, the first `validators` of which are validators.
    fn new(n: usize, validators: usize) -> Self {
        let accounts = test_accounts(n);
        let mut genesis = GenesisConfig::default();
        for account in &accounts {
            genesis = genesis.with_account(account.address, 1_000_000);
        }
        for account in accounts.iter().take(validators) {
            genesis = genesis.with_validator(&account.address, 10);
        }
        Self {
            chain: SimChain::new(genesis).unwrap(),
            accounts,
        }
    }

    fn submit(&mut self, index: usize, msg: Msg) -> (bool, String) {
        let account = &self.accounts[index];
        let sequence = self.chain.state().sequence(&account.address).unwrap();
        let tx = gravity_types::Tx::sign(
            self.chain.chain_id(),
            account,
            sequence,
            vec![msg],
            Coins::new(),
        )
        .unwrap();
        let result = self.chain.deliver(tx).unwrap();
        (result.applied, result.log)
    }

    fn delegate(&mut self, index: usize) {
        let account = self.accounts[index].clone();
        let sequence = self.chain.state().sequence(&account.address).unwrap();
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
        let (applied, log) = self.submit(index, msg);
        assert!(applied, "{log}");
    }

    fn send(&mut self, index: usize, amount: u128, fee: u128) {
        let sender = self.accounts[index].address;
        let (applied, log) = self.submit(
            index,
            Msg::SendToEthereum(MsgSendToEthereum {
                sender,
                ethereum_recipient: EthAddress([0x42; 20]),
                amount: Coin::new(BOND_DENOM, amount),
                bridge_fee: Coin::new(BOND_DENOM, fee),
            }),
        );
        assert!(applied, "{log}");
    }

    fn gravity_id(&self) -> Vec<u8> {
        self.chain.state().params().unwrap().gravity_id.into_bytes()
    }
}

#[test]
#[traced_test]
fn test_signer_set_confirmation_round_trip() {
    let mut h = Harness::new(2, 2);
    h.delegate(0);
    h.chain.end_block();

    let set = h.chain.state().latest_signer_set_tx().unwrap();
    let account = h.accounts[0].clone();
    let signature = new_ethereum_signature(&set.checkpoint(&h.gravity_id()), &account.priv_key);
    let msg = Msg::SubmitEthereumTxConfirmation(MsgSubmitEthereumTxConfirmation {
        confirmation: EthereumTxConfirmation::SignerSetTx(SignerSetTxConfirmation {
            signer_set_nonce: set.nonce,
            ethereum_signer: account.eth_address,
            signature,
        }),
        signer: account.address,
    });

    let (applied, log) = h.submit(0, msg.clone());
    assert!(applied, "{log}");
    let key = OutgoingTxKey::SignerSet(set.nonce);
    assert!(h
        .chain
        .state()
        .confirmation(&key, &account.val_address())
        .is_some());

    // The same validator cannot confirm twice.
    let (applied, _) = h.submit(0, msg);
    assert!(!applied);
}

#[test]
fn test_confirmation_with_wrong_key_rejected() {
    let mut h = Harness::new(2, 2);
    h.delegate(0);
    h.chain.end_block();

    let set = h.chain.state().latest_signer_set_tx().unwrap();
    let signer = h.accounts[0].clone();
    let impostor = h.accounts[1].clone();
    let msg = Msg::SubmitEthereumTxConfirmation(MsgSubmitEthereumTxConfirmation {
        confirmation: EthereumTxConfirmation::SignerSetTx(SignerSetTxConfirmation {
            signer_set_nonce: set.nonce,
            ethereum_signer: signer.eth_address,
            signature: new_ethereum_signature(
                &set.checkpoint(&h.gravity_id()),
                &impostor.priv_key,
            ),
        }),
        signer: signer.address,
    });
    let (applied, log) = h.submit(0, msg);
    assert!(!applied);
    assert!(log.contains("signature"), "{log}");
}

#[test]
fn test_batch_takes_highest_fees_first() {
    let mut h = Harness::new(3, 1);
    h.send(1, 100, 1);
    h.send(2, 100, 9);
    h.send(1, 100, 5);

    let signer = h.accounts[0].address;
    let (applied, log) = h.submit(
        0,
        Msg::RequestBatchTx(MsgRequestBatchTx {
            denom: BOND_DENOM.into(),
            signer,
        }),
    );
    assert!(applied, "{log}");

    let batch = h.chain.state().latest_batch_tx().unwrap();
    let fees: Vec<u128> = batch
        .transactions
        .iter()
        .map(|t| t.erc20_fee.amount)
        .collect();
    assert_eq!(fees, vec![9, 5, 1]);
    assert!(h.chain.state().unbatched_send_to_ethereums().is_empty());

    // Nothing left to batch.
    let (applied, _) = h.submit(
        0,
        Msg::RequestBatchTx(MsgRequestBatchTx {
            denom: BOND_DENOM.into(),
            signer,
        }),
    );
    assert!(!applied);
}

#[test]
fn test_batch_confirmation() {
    let mut h = Harness::new(2, 1);
    h.delegate(0);
    h.send(1, 50, 2);
    let signer = h.accounts[0].clone();
    h.submit(
        0,
        Msg::RequestBatchTx(MsgRequestBatchTx {
            denom: BOND_DENOM.into(),
            signer: signer.address,
        }),
    );
    let batch = h.chain.state().latest_batch_tx().unwrap();

    let msg = Msg::SubmitEthereumTxConfirmation(MsgSubmitEthereumTxConfirmation {
        confirmation: EthereumTxConfirmation::BatchTx(BatchTxConfirmation {
            token_contract: batch.token_contract,
            batch_nonce: batch.batch_nonce,
            ethereum_signer: signer.eth_address,
            signature: new_ethereum_signature(
                &batch.checkpoint(&h.gravity_id()),
                &signer.priv_key,
            ),
        }),
        signer: signer.address,
    });
    let (applied, log) = h.submit(0, msg);
    assert!(applied, "{log}");
}

#[test]
fn test_contract_call_confirmation() {
    let mut h = Harness::new(1, 1);
    h.delegate(0);
    let nonce = h.chain.schedule_contract_call(ContractCallTx {
        invalidation_nonce: 0,
        invalidation_scope: b"scope".to_vec(),
        address: EthAddress([0x77; 20]),
        payload: vec![0xde, 0xad],
        timeout: 1_000,
        tokens: vec![],
        fees: vec![],
        height: 0,
    });
    let call = h.chain.state().latest_contract_call_tx().unwrap();
    assert_eq!(call.invalidation_nonce, nonce);

    let signer = h.accounts[0].clone();
    let msg = Msg::SubmitEthereumTxConfirmation(MsgSubmitEthereumTxConfirmation {
        confirmation: EthereumTxConfirmation::ContractCallTx(ContractCallTxConfirmation {
            invalidation_scope: call.invalidation_scope.clone(),
            invalidation_nonce: call.invalidation_nonce,
            ethereum_signer: signer.eth_address,
            signature: new_ethereum_signature(
                &call.checkpoint(&h.gravity_id()),
                &signer.priv_key,
            ),
        }),
        signer: signer.address,
    });
    let (applied, log) = h.submit(0, msg);
    assert!(applied, "{log}");
}

#[test]
fn test_cancel_refunds_unbatched_transfer() {
    let mut h = Harness::new(2, 1);
    let sender = h.accounts[1].address;
    let before = h.chain.state().spendable_coin(&sender, BOND_DENOM).amount;
    h.send(1, 300, 20);
    let id = h.chain.state().unbatched_send_to_ethereums()[0].id;

    // Only the sender may cancel.
    let (applied, _) = h.submit(
        0,
        Msg::CancelSendToEthereum(MsgCancelSendToEthereum {
            id,
            sender: h.accounts[0].address,
        }),
    );
    assert!(!applied);

    let (applied, log) = h.submit(
        1,
        Msg::CancelSendToEthereum(MsgCancelSendToEthereum { id, sender }),
    );
    assert!(applied, "{log}");
    assert_eq!(
        h.chain.state().spendable_coin(&sender, BOND_DENOM).amount,
        before
    );
    assert_eq!(h.chain.state().module_escrow().amount_of(BOND_DENOM), 0);
}

#[test]
fn test_event_nonces_must_be_contiguous() {
    let mut h = Harness::new(2, 2);
    let validator = h.accounts[0].clone();
    let receiver = h.accounts[1].address;
    let event = |nonce: u64| {
        Msg::SubmitEthereumEvent(MsgSubmitEthereumEvent {
            event: EthereumEvent::SendToCosmos(SendToCosmosEvent {
                event_nonce: nonce,
                token_contract: EthAddress([0x99; 20]),
                amount: 7,
                ethereum_sender: EthAddress([0x01; 20]),
                cosmos_receiver: receiver,
                ethereum_height: 100 + nonce,
            }),
            signer: validator.address,
        })
    };

    let (applied, _) = h.submit(0, event(2));
    assert!(!applied);

    let (applied, log) = h.submit(0, event(1));
    assert!(applied, "{log}");
    let state = h.chain.state();
    assert_eq!(state.last_event_nonce_by_validator(&validator.val_address()), 1);
    assert_eq!(state.last_observed_ethereum_height(), 101);
    let minted = state
        .spendable_coins(&receiver)
        .iter()
        .find(|c| c.denom.starts_with("gravity0x"))
        .map(|c| c.amount);
    assert_eq!(minted, Some(7));

    // A second validator reporting the same nonce does not mint again.
    let second = h.accounts[1].clone();
    let (applied, _) = h.submit(
        1,
        Msg::SubmitEthereumEvent(MsgSubmitEthereumEvent {
            event: EthereumEvent::SendToCosmos(SendToCosmosEvent {
                event_nonce: 1,
                token_contract: EthAddress([0x99; 20]),
                amount: 7,
                ethereum_sender: EthAddress([0x01; 20]),
                cosmos_receiver: receiver,
                ethereum_height: 101,
            }),
            signer: second.address,
        }),
    );
    assert!(applied);
    let again = h
        .chain
        .state()
        .spendable_coins(&receiver)
        .iter()
        .find(|c| c.denom.starts_with("gravity0x"))
        .map(|c| c.amount);
    assert_eq!(again, Some(7));
}

#[test]
fn test_height_votes_need_two_thirds() {
    let mut h = Harness::new(3, 3);
    let vote = |signer, height| {
        Msg::EthereumHeightVote(MsgEthereumHeightVote {
            ethereum_height: height,
            signer,
        })
    };

    let a = h.accounts[0].address;
    let b = h.accounts[1].address;
    h.submit(0, vote(a, 500));
    assert_eq!(h.chain.state().last_observed_ethereum_height(), 0);

    h.submit(1, vote(b, 400));
    assert_eq!(h.chain.state().last_observed_ethereum_height(), 400);
}

#[test]
fn test_random_transfers_conserve_supply() {
    let mut h = Harness::new(4, 1);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let supply = h.chain.state().supply_of(BOND_DENOM);

    for _ in 0..20 {
        let index = rng.gen_range(1..4);
        let amount = rng.gen_range(1..1_000);
        let fee = rng.gen_range(0..50);
        h.send(index, amount, fee);
    }
    assert_eq!(h.chain.state().supply_of(BOND_DENOM), supply);
    assert_eq!(h.chain.state().unbatched_send_to_ethereums().len(), 20);
}
