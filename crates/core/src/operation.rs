//! Operation kinds and outcome descriptors.

use gravity_types::{
    Msg, TYPE_MSG_CANCEL_SEND_TO_ETHEREUM, TYPE_MSG_DELEGATE_KEYS, TYPE_MSG_ETHEREUM_HEIGHT_VOTE,
    TYPE_MSG_REQUEST_BATCH_TX, TYPE_MSG_SEND_TO_ETHEREUM, TYPE_MSG_SUBMIT_ETHEREUM_EVENT,
    TYPE_MSG_SUBMIT_ETHEREUM_TX_CONFIRMATION,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the module every operation belongs to.
pub const MODULE_NAME: &str = "gravity";

/// The simulated gravity operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    // ═══════════════════════════════════════════════════════════════════════
    // Orchestrator Operations
    // ═══════════════════════════════════════════════════════════════════════
    /// Bind a validator to an orchestrator and an Ethereum key.
    DelegateKeys,

    /// Sign a pending outgoing transaction.
    SubmitEthereumTxConfirmation,

    /// Attest to an event observed on Ethereum.
    SubmitEthereumEvent,

    /// Vote on the latest Ethereum height.
    EthereumHeightVote,

    // ═══════════════════════════════════════════════════════════════════════
    // User Operations
    // ═══════════════════════════════════════════════════════════════════════
    /// Move funds to Ethereum.
    SendToEthereum,

    /// Ask for pending transfers to be batched.
    RequestBatchTx,

    /// Withdraw a transfer that has not been batched.
    CancelSendToEthereum,
}

impl OperationKind {
    /// Every kind, in registration order.
    pub const ALL: [OperationKind; 7] = [
        OperationKind::DelegateKeys,
        OperationKind::SubmitEthereumTxConfirmation,
        OperationKind::SubmitEthereumEvent,
        OperationKind::SendToEthereum,
        OperationKind::RequestBatchTx,
        OperationKind::CancelSendToEthereum,
        OperationKind::EthereumHeightVote,
    ];

    /// The configuration key holding this operation's weight.
    pub fn weight_key(&self) -> &'static str {
        match self {
            OperationKind::DelegateKeys => "op_weight_delegate_keys",
            OperationKind::SubmitEthereumTxConfirmation => {
                "op_weight_msg_submit_ethereum_tx_confirmation"
            }
            OperationKind::SubmitEthereumEvent => "op_weight_msg_submit_ethereum_event",
            OperationKind::SendToEthereum => "op_weight_msg_send_to_ethereum",
            OperationKind::RequestBatchTx => "op_weight_msg_request_batch_tx",
            OperationKind::CancelSendToEthereum => "op_weight_msg_cancel_send_to_ethereum",
            OperationKind::EthereumHeightVote => "op_weight_msg_ethereum_height_vote",
        }
    }

    /// Type URL of the message this operation submits.
    pub fn type_url(&self) -> &'static str {
        match self {
            OperationKind::DelegateKeys => TYPE_MSG_DELEGATE_KEYS,
            OperationKind::SubmitEthereumTxConfirmation => TYPE_MSG_SUBMIT_ETHEREUM_TX_CONFIRMATION,
            OperationKind::SubmitEthereumEvent => TYPE_MSG_SUBMIT_ETHEREUM_EVENT,
            OperationKind::SendToEthereum => TYPE_MSG_SEND_TO_ETHEREUM,
            OperationKind::RequestBatchTx => TYPE_MSG_REQUEST_BATCH_TX,
            OperationKind::CancelSendToEthereum => TYPE_MSG_CANCEL_SEND_TO_ETHEREUM,
            OperationKind::EthereumHeightVote => TYPE_MSG_ETHEREUM_HEIGHT_VOTE,
        }
    }

    /// Get a human-readable name for this operation.
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationKind::DelegateKeys => "DelegateKeys",
            OperationKind::SubmitEthereumTxConfirmation => "SubmitEthereumTxConfirmation",
            OperationKind::SubmitEthereumEvent => "SubmitEthereumEvent",
            OperationKind::SendToEthereum => "SendToEthereum",
            OperationKind::RequestBatchTx => "RequestBatchTx",
            OperationKind::CancelSendToEthereum => "CancelSendToEthereum",
            OperationKind::EthereumHeightVote => "EthereumHeightVote",
        }
    }

    /// Whether only validator accounts can perform this operation.
    pub fn requires_validator(&self) -> bool {
        matches!(
            self,
            OperationKind::DelegateKeys
                | OperationKind::SubmitEthereumTxConfirmation
                | OperationKind::SubmitEthereumEvent
                | OperationKind::EthereumHeightVote
                | OperationKind::RequestBatchTx
        )
    }

    /// The kind that produces `msg`.
    pub fn of_msg(msg: &Msg) -> Self {
        match msg {
            Msg::DelegateKeys(_) => OperationKind::DelegateKeys,
            Msg::SubmitEthereumTxConfirmation(_) => OperationKind::SubmitEthereumTxConfirmation,
            Msg::SubmitEthereumEvent(_) => OperationKind::SubmitEthereumEvent,
            Msg::SendToEthereum(_) => OperationKind::SendToEthereum,
            Msg::RequestBatchTx(_) => OperationKind::RequestBatchTx,
            Msg::CancelSendToEthereum(_) => OperationKind::CancelSendToEthereum,
            Msg::EthereumHeightVote(_) => OperationKind::EthereumHeightVote,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation kind: {0}")]
pub struct UnknownOperationKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    /// Accepts the type name, the weight key or the message type URL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|k| k.type_name() == s || k.weight_key() == s || k.type_url() == s)
            .ok_or_else(|| UnknownOperationKind(s.to_string()))
    }
}

/// What an operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationMsg {
    /// A transaction was built and delivered.
    Delivered {
        kind: OperationKind,
        msg: Msg,
        /// Whether the chain applied the message.
        applied: bool,
        comment: String,
    },

    /// Nothing was submitted.
    NoOp { kind: OperationKind, reason: String },
}

impl OperationMsg {
    pub fn delivered(msg: Msg, applied: bool, comment: impl Into<String>) -> Self {
        OperationMsg::Delivered {
            kind: OperationKind::of_msg(&msg),
            msg,
            applied,
            comment: comment.into(),
        }
    }

    pub fn no_op(kind: OperationKind, reason: impl Into<String>) -> Self {
        OperationMsg::NoOp {
            kind,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationMsg::Delivered { kind, .. } | OperationMsg::NoOp { kind, .. } => *kind,
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, OperationMsg::NoOp { .. })
    }

    /// Whether a message was delivered and applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, OperationMsg::Delivered { applied: true, .. })
    }

    /// The no-op reason, if this is a no-op.
    pub fn reason(&self) -> Option<&str> {
        match self {
            OperationMsg::NoOp { reason, .. } => Some(reason),
            OperationMsg::Delivered { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_keys_are_unique() {
        let mut keys: Vec<_> = OperationKind::ALL.iter().map(|k| k.weight_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), OperationKind::ALL.len());
    }

    #[test]
    fn test_parse_accepts_all_identifiers() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.type_name().parse::<OperationKind>(), Ok(kind));
            assert_eq!(kind.weight_key().parse::<OperationKind>(), Ok(kind));
            assert_eq!(kind.type_url().parse::<OperationKind>(), Ok(kind));
        }
        assert!("Transfer".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_no_op_reason() {
        let msg = OperationMsg::no_op(OperationKind::DelegateKeys, "no validator");
        assert!(msg.is_no_op());
        assert!(!msg.is_applied());
        assert_eq!(msg.reason(), Some("no validator"));
        assert_eq!(msg.kind(), OperationKind::DelegateKeys);
    }

    #[test]
    fn test_operation_msg_serializes() {
        let msg = OperationMsg::no_op(OperationKind::RequestBatchTx, "nothing to batch");
        let json = serde_json::to_string(&msg).unwrap();
        let back: OperationMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
