//! Bridge state records: validators, signer sets, batches, contract calls.

use crate::address::{AccAddress, EthAddress, ValAddress};
use crate::hash::Hash;
use crate::signing::{
    batch_checkpoint_payload, logic_call_checkpoint_payload, signer_set_checkpoint_payload,
    BatchEntry, Erc20Amount, LogicCallPayload,
};
use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;

/// A staking validator record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: ValAddress,
    pub power: u64,
    pub jailed: bool,
}

/// Module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Protocol identifier mixed into every checkpoint.
    pub gravity_id: String,
    pub bridge_ethereum_address: EthAddress,
    pub bridge_chain_id: u64,
    /// How far in the future (Ethereum blocks) outgoing transactions time out.
    pub target_eth_tx_timeout: u64,
    /// Maximum number of transfers per batch.
    pub batch_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            gravity_id: "gravity-sim".to_string(),
            bridge_ethereum_address: EthAddress([0x8f; 20]),
            bridge_chain_id: 1,
            target_eth_tx_timeout: 43_200,
            batch_size: 100,
        }
    }
}

/// Something validators must sign before it can be relayed to Ethereum.
pub trait OutgoingTx {
    /// The ABI-encoded checkpoint payload for `gravity_id`.
    fn checkpoint_payload(&self, gravity_id: &[u8]) -> Vec<u8>;

    /// Keccak-256 of the checkpoint payload.
    fn checkpoint(&self, gravity_id: &[u8]) -> Hash {
        Hash::from_bytes(&self.checkpoint_payload(gravity_id))
    }
}

/// A member of an Ethereum signer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumSigner {
    pub power: u64,
    pub ethereum_address: EthAddress,
}

/// The active signer set as it should be installed on the Ethereum contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSetTx {
    pub nonce: u64,
    pub height: u64,
    pub signers: Vec<EthereumSigner>,
}

impl SignerSetTx {
    /// Whether `other` has the same members with the same powers.
    pub fn same_members(&self, signers: &[EthereumSigner]) -> bool {
        self.signers == signers
    }
}

impl OutgoingTx for SignerSetTx {
    fn checkpoint_payload(&self, gravity_id: &[u8]) -> Vec<u8> {
        let signers: Vec<(EthAddress, u64)> = self
            .signers
            .iter()
            .map(|s| (s.ethereum_address, s.power))
            .collect();
        signer_set_checkpoint_payload(gravity_id, self.nonce, &signers)
    }
}

/// An ERC20 amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Token {
    pub contract: EthAddress,
    pub amount: u128,
}

/// A pending transfer to Ethereum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendToEthereum {
    pub id: u64,
    pub sender: AccAddress,
    pub ethereum_recipient: EthAddress,
    pub erc20_token: Erc20Token,
    pub erc20_fee: Erc20Token,
}

/// A batch of transfers of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTx {
    pub batch_nonce: u64,
    pub timeout: u64,
    pub transactions: Vec<SendToEthereum>,
    pub token_contract: EthAddress,
    pub height: u64,
}

impl OutgoingTx for BatchTx {
    fn checkpoint_payload(&self, gravity_id: &[u8]) -> Vec<u8> {
        let entries: Vec<BatchEntry> = self
            .transactions
            .iter()
            .map(|tx| {
                (
                    tx.erc20_token.amount,
                    tx.ethereum_recipient,
                    tx.erc20_fee.amount,
                )
            })
            .collect();
        batch_checkpoint_payload(
            gravity_id,
            &entries,
            self.batch_nonce,
            &self.token_contract,
            self.timeout,
        )
    }
}

/// An arbitrary contract call relayed by the bridge.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallTx {
    pub invalidation_nonce: u64,
    #[serde_as(as = "Hex")]
    pub invalidation_scope: Vec<u8>,
    pub address: EthAddress,
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    pub timeout: u64,
    pub tokens: Vec<Erc20Token>,
    pub fees: Vec<Erc20Token>,
    pub height: u64,
}

impl OutgoingTx for ContractCallTx {
    fn checkpoint_payload(&self, gravity_id: &[u8]) -> Vec<u8> {
        let transfers: Vec<Erc20Amount> = self
            .tokens
            .iter()
            .map(|t| (t.contract, t.amount))
            .collect();
        let fees: Vec<Erc20Amount> = self.fees.iter().map(|t| (t.contract, t.amount)).collect();
        logic_call_checkpoint_payload(
            gravity_id,
            &LogicCallPayload {
                transfers: &transfers,
                fees: &fees,
                logic_contract: &self.address,
                payload: &self.payload,
                timeout: self.timeout,
                invalidation_scope: &self.invalidation_scope,
                invalidation_nonce: self.invalidation_nonce,
            },
        )
    }
}
