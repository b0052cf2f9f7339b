//! Gravity module messages.
//!
//! Every message serializes with an `@type` tag carrying its protocol type
//! URL, mirroring how the chain packs messages into `Any` envelopes.

use crate::address::{AccAddress, EthAddress, ValAddress};
use crate::coin::Coin;
use crate::crypto::EthSignature;
use crate::state::EthereumSigner;
use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;
use std::fmt;
use std::str::FromStr;

pub const TYPE_MSG_DELEGATE_KEYS: &str = "/gravity.v1.MsgDelegateKeys";
pub const TYPE_MSG_SUBMIT_ETHEREUM_TX_CONFIRMATION: &str =
    "/gravity.v1.MsgSubmitEthereumTxConfirmation";
pub const TYPE_MSG_SUBMIT_ETHEREUM_EVENT: &str = "/gravity.v1.MsgSubmitEthereumEvent";
pub const TYPE_MSG_SEND_TO_ETHEREUM: &str = "/gravity.v1.MsgSendToEthereum";
pub const TYPE_MSG_REQUEST_BATCH_TX: &str = "/gravity.v1.MsgRequestBatchTx";
pub const TYPE_MSG_CANCEL_SEND_TO_ETHEREUM: &str = "/gravity.v1.MsgCancelSendToEthereum";
pub const TYPE_MSG_ETHEREUM_HEIGHT_VOTE: &str = "/gravity.v1.MsgEthereumHeightVote";

/// Stateless validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MsgError {
    #[error("empty Ethereum signature")]
    EmptyEthSig,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid denom: {0}")]
    InvalidDenom(String),

    #[error("nonce must be positive")]
    ZeroNonce,

    #[error("invalid ethereum recipient: {0}")]
    InvalidRecipient(String),

    #[error("unknown confirmation type: {0}")]
    UnknownConfirmationKind(String),
}

/// Bind a validator to an orchestrator account and an Ethereum key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegateKeys {
    pub validator_address: ValAddress,
    pub orchestrator_address: AccAddress,
    pub ethereum_address: EthAddress,
    pub eth_signature: EthSignature,
}

/// Confirmation subtypes, one per kind of outgoing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfirmationKind {
    SignerSetTx,
    BatchTx,
    ContractCallTx,
}

impl ConfirmationKind {
    pub const ALL: [ConfirmationKind; 3] = [
        ConfirmationKind::SignerSetTx,
        ConfirmationKind::BatchTx,
        ConfirmationKind::ContractCallTx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationKind::SignerSetTx => "SignerSetTx",
            ConfirmationKind::BatchTx => "BatchTx",
            ConfirmationKind::ContractCallTx => "ContractCallTx",
        }
    }
}

impl fmt::Display for ConfirmationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationKind {
    type Err = MsgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfirmationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| MsgError::UnknownConfirmationKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSetTxConfirmation {
    pub signer_set_nonce: u64,
    pub ethereum_signer: EthAddress,
    pub signature: EthSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTxConfirmation {
    pub token_contract: EthAddress,
    pub batch_nonce: u64,
    pub ethereum_signer: EthAddress,
    pub signature: EthSignature,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallTxConfirmation {
    #[serde_as(as = "Hex")]
    pub invalidation_scope: Vec<u8>,
    pub invalidation_nonce: u64,
    pub ethereum_signer: EthAddress,
    pub signature: EthSignature,
}

/// The generic confirmation envelope, tagged by subtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum EthereumTxConfirmation {
    #[serde(rename = "/gravity.v1.SignerSetTxConfirmation")]
    SignerSetTx(SignerSetTxConfirmation),
    #[serde(rename = "/gravity.v1.BatchTxConfirmation")]
    BatchTx(BatchTxConfirmation),
    #[serde(rename = "/gravity.v1.ContractCallTxConfirmation")]
    ContractCallTx(ContractCallTxConfirmation),
}

impl EthereumTxConfirmation {
    pub fn kind(&self) -> ConfirmationKind {
        match self {
            EthereumTxConfirmation::SignerSetTx(_) => ConfirmationKind::SignerSetTx,
            EthereumTxConfirmation::BatchTx(_) => ConfirmationKind::BatchTx,
            EthereumTxConfirmation::ContractCallTx(_) => ConfirmationKind::ContractCallTx,
        }
    }

    pub fn ethereum_signer(&self) -> &EthAddress {
        match self {
            EthereumTxConfirmation::SignerSetTx(c) => &c.ethereum_signer,
            EthereumTxConfirmation::BatchTx(c) => &c.ethereum_signer,
            EthereumTxConfirmation::ContractCallTx(c) => &c.ethereum_signer,
        }
    }

    pub fn signature(&self) -> &EthSignature {
        match self {
            EthereumTxConfirmation::SignerSetTx(c) => &c.signature,
            EthereumTxConfirmation::BatchTx(c) => &c.signature,
            EthereumTxConfirmation::ContractCallTx(c) => &c.signature,
        }
    }

    fn validate_basic(&self) -> Result<(), MsgError> {
        if self.signature().is_empty() {
            return Err(MsgError::EmptyEthSig);
        }
        let nonce = match self {
            EthereumTxConfirmation::SignerSetTx(c) => c.signer_set_nonce,
            EthereumTxConfirmation::BatchTx(c) => c.batch_nonce,
            EthereumTxConfirmation::ContractCallTx(c) => c.invalidation_nonce,
        };
        if nonce == 0 {
            return Err(MsgError::ZeroNonce);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitEthereumTxConfirmation {
    pub confirmation: EthereumTxConfirmation,
    pub signer: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendToCosmosEvent {
    pub event_nonce: u64,
    pub token_contract: EthAddress,
    pub amount: u128,
    pub ethereum_sender: EthAddress,
    pub cosmos_receiver: AccAddress,
    pub ethereum_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchExecutedEvent {
    pub event_nonce: u64,
    pub token_contract: EthAddress,
    pub batch_nonce: u64,
    pub ethereum_height: u64,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallExecutedEvent {
    pub event_nonce: u64,
    #[serde_as(as = "Hex")]
    pub invalidation_scope: Vec<u8>,
    pub invalidation_nonce: u64,
    pub ethereum_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20DeployedEvent {
    pub event_nonce: u64,
    pub cosmos_denom: String,
    pub token_contract: EthAddress,
    pub erc20_name: String,
    pub erc20_symbol: String,
    pub erc20_decimals: u64,
    pub ethereum_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSetTxExecutedEvent {
    pub event_nonce: u64,
    pub signer_set_tx_nonce: u64,
    pub ethereum_height: u64,
    pub members: Vec<EthereumSigner>,
}

/// An event observed on the Ethereum contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum EthereumEvent {
    #[serde(rename = "/gravity.v1.SendToCosmosEvent")]
    SendToCosmos(SendToCosmosEvent),
    #[serde(rename = "/gravity.v1.BatchExecutedEvent")]
    BatchExecuted(BatchExecutedEvent),
    #[serde(rename = "/gravity.v1.ContractCallExecutedEvent")]
    ContractCallExecuted(ContractCallExecutedEvent),
    #[serde(rename = "/gravity.v1.ERC20DeployedEvent")]
    Erc20Deployed(Erc20DeployedEvent),
    #[serde(rename = "/gravity.v1.SignerSetTxExecutedEvent")]
    SignerSetTxExecuted(SignerSetTxExecutedEvent),
}

impl EthereumEvent {
    pub fn event_nonce(&self) -> u64 {
        match self {
            EthereumEvent::SendToCosmos(e) => e.event_nonce,
            EthereumEvent::BatchExecuted(e) => e.event_nonce,
            EthereumEvent::ContractCallExecuted(e) => e.event_nonce,
            EthereumEvent::Erc20Deployed(e) => e.event_nonce,
            EthereumEvent::SignerSetTxExecuted(e) => e.event_nonce,
        }
    }

    pub fn ethereum_height(&self) -> u64 {
        match self {
            EthereumEvent::SendToCosmos(e) => e.ethereum_height,
            EthereumEvent::BatchExecuted(e) => e.ethereum_height,
            EthereumEvent::ContractCallExecuted(e) => e.ethereum_height,
            EthereumEvent::Erc20Deployed(e) => e.ethereum_height,
            EthereumEvent::SignerSetTxExecuted(e) => e.ethereum_height,
        }
    }

    fn validate_basic(&self) -> Result<(), MsgError> {
        if self.event_nonce() == 0 {
            return Err(MsgError::ZeroNonce);
        }
        match self {
            EthereumEvent::SendToCosmos(e) if e.amount == 0 => {
                Err(MsgError::InvalidAmount("zero send to cosmos amount".into()))
            }
            EthereumEvent::Erc20Deployed(e) if !Coin::is_valid_denom(&e.cosmos_denom) => {
                Err(MsgError::InvalidDenom(e.cosmos_denom.clone()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitEthereumEvent {
    pub event: EthereumEvent,
    pub signer: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendToEthereum {
    pub sender: AccAddress,
    pub ethereum_recipient: EthAddress,
    pub amount: Coin,
    pub bridge_fee: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRequestBatchTx {
    pub denom: String,
    pub signer: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelSendToEthereum {
    pub id: u64,
    pub sender: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEthereumHeightVote {
    pub ethereum_height: u64,
    pub signer: AccAddress,
}

/// Any gravity module message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Msg {
    #[serde(rename = "/gravity.v1.MsgDelegateKeys")]
    DelegateKeys(MsgDelegateKeys),
    #[serde(rename = "/gravity.v1.MsgSubmitEthereumTxConfirmation")]
    SubmitEthereumTxConfirmation(MsgSubmitEthereumTxConfirmation),
    #[serde(rename = "/gravity.v1.MsgSubmitEthereumEvent")]
    SubmitEthereumEvent(MsgSubmitEthereumEvent),
    #[serde(rename = "/gravity.v1.MsgSendToEthereum")]
    SendToEthereum(MsgSendToEthereum),
    #[serde(rename = "/gravity.v1.MsgRequestBatchTx")]
    RequestBatchTx(MsgRequestBatchTx),
    #[serde(rename = "/gravity.v1.MsgCancelSendToEthereum")]
    CancelSendToEthereum(MsgCancelSendToEthereum),
    #[serde(rename = "/gravity.v1.MsgEthereumHeightVote")]
    EthereumHeightVote(MsgEthereumHeightVote),
}

impl Msg {
    /// Protocol type URL.
    pub fn type_url(&self) -> &'static str {
        match self {
            Msg::DelegateKeys(_) => TYPE_MSG_DELEGATE_KEYS,
            Msg::SubmitEthereumTxConfirmation(_) => TYPE_MSG_SUBMIT_ETHEREUM_TX_CONFIRMATION,
            Msg::SubmitEthereumEvent(_) => TYPE_MSG_SUBMIT_ETHEREUM_EVENT,
            Msg::SendToEthereum(_) => TYPE_MSG_SEND_TO_ETHEREUM,
            Msg::RequestBatchTx(_) => TYPE_MSG_REQUEST_BATCH_TX,
            Msg::CancelSendToEthereum(_) => TYPE_MSG_CANCEL_SEND_TO_ETHEREUM,
            Msg::EthereumHeightVote(_) => TYPE_MSG_ETHEREUM_HEIGHT_VOTE,
        }
    }

    /// The account that must sign the enclosing transaction.
    pub fn signer(&self) -> AccAddress {
        match self {
            Msg::DelegateKeys(m) => m.validator_address.account(),
            Msg::SubmitEthereumTxConfirmation(m) => m.signer,
            Msg::SubmitEthereumEvent(m) => m.signer,
            Msg::SendToEthereum(m) => m.sender,
            Msg::RequestBatchTx(m) => m.signer,
            Msg::CancelSendToEthereum(m) => m.sender,
            Msg::EthereumHeightVote(m) => m.signer,
        }
    }

    /// Stateless checks run before any handler.
    pub fn validate_basic(&self) -> Result<(), MsgError> {
        match self {
            Msg::DelegateKeys(m) => {
                if m.eth_signature.is_empty() {
                    return Err(MsgError::EmptyEthSig);
                }
                Ok(())
            }
            Msg::SubmitEthereumTxConfirmation(m) => m.confirmation.validate_basic(),
            Msg::SubmitEthereumEvent(m) => m.event.validate_basic(),
            Msg::SendToEthereum(m) => {
                if !Coin::is_valid_denom(&m.amount.denom) {
                    return Err(MsgError::InvalidDenom(m.amount.denom.clone()));
                }
                if m.amount.is_zero() {
                    return Err(MsgError::InvalidAmount("zero transfer amount".into()));
                }
                if m.amount.denom != m.bridge_fee.denom {
                    return Err(MsgError::InvalidAmount(format!(
                        "fee denom {} differs from amount denom {}",
                        m.bridge_fee.denom, m.amount.denom
                    )));
                }
                if m.ethereum_recipient == EthAddress::ZERO {
                    return Err(MsgError::InvalidRecipient(m.ethereum_recipient.to_string()));
                }
                Ok(())
            }
            Msg::RequestBatchTx(m) => {
                if !Coin::is_valid_denom(&m.denom) {
                    return Err(MsgError::InvalidDenom(m.denom.clone()));
                }
                Ok(())
            }
            Msg::CancelSendToEthereum(m) => {
                if m.id == 0 {
                    return Err(MsgError::ZeroNonce);
                }
                Ok(())
            }
            Msg::EthereumHeightVote(_) => Ok(()),
        }
    }
}
