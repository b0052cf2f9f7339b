//! Signing payloads for every signed artifact of the bridge.
//!
//! Validators sign two families of payloads:
//!
//! | Payload | Purpose |
//! |---------|---------|
//! | `checkpoint` | Ethereum signer set update |
//! | `transactionBatch` | Outgoing transfer batch |
//! | `logicCall` | Arbitrary contract call |
//! | `DelegateKeysSignMsg` | Binding of a validator to its Ethereum key |
//!
//! The checkpoint payloads are the `abi.encode` of the exact argument list
//! the Gravity contract hashes, with the method name stored as a `bytes32`
//! in second position, encoded with `alloy-sol-types`. Keccak-256 of the
//! payload is the checkpoint hash that gets signed as an EIP-191 personal
//! message.

use crate::address::{AccAddress, EthAddress, ValAddress};
use crate::coin::Coins;
use crate::msgs::Msg;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Method tag for signer set checkpoints.
pub const METHOD_CHECKPOINT: &[u8] = b"checkpoint";

/// Method tag for batch checkpoints.
pub const METHOD_TRANSACTION_BATCH: &[u8] = b"transactionBatch";

/// Method tag for contract call checkpoints.
pub const METHOD_LOGIC_CALL: &[u8] = b"logicCall";

/// Left-aligned, zero-padded `bytes32`. Input longer than 32 bytes is truncated.
fn bytes32(bytes: &[u8]) -> B256 {
    B256::right_padding_from(&bytes[..bytes.len().min(32)])
}

fn addresses<'a>(items: impl IntoIterator<Item = &'a EthAddress>) -> Vec<Address> {
    items.into_iter().map(|a| Address::from(*a)).collect()
}

fn amounts(items: impl IntoIterator<Item = u128>) -> Vec<U256> {
    items.into_iter().map(U256::from).collect()
}

/// Build the checkpoint payload for a signer set.
///
/// Format: `abi.encode(gravity_id, "checkpoint", nonce, signers[], powers[])`
pub fn signer_set_checkpoint_payload(
    gravity_id: &[u8],
    nonce: u64,
    signers: &[(EthAddress, u64)],
) -> Vec<u8> {
    (
        bytes32(gravity_id),
        bytes32(METHOD_CHECKPOINT),
        U256::from(nonce),
        addresses(signers.iter().map(|(a, _)| a)),
        amounts(signers.iter().map(|(_, p)| u128::from(*p))),
    )
        .abi_encode_params()
}

/// A single transfer as it appears in a batch checkpoint: `(amount, destination, fee)`.
pub type BatchEntry = (u128, EthAddress, u128);

/// Build the checkpoint payload for a transaction batch.
///
/// Format: `abi.encode(gravity_id, "transactionBatch", amounts[], destinations[], fees[],
/// batch_nonce, token_contract, timeout)`
pub fn batch_checkpoint_payload(
    gravity_id: &[u8],
    entries: &[BatchEntry],
    batch_nonce: u64,
    token_contract: &EthAddress,
    timeout: u64,
) -> Vec<u8> {
    (
        bytes32(gravity_id),
        bytes32(METHOD_TRANSACTION_BATCH),
        amounts(entries.iter().map(|(a, _, _)| *a)),
        addresses(entries.iter().map(|(_, d, _)| d)),
        amounts(entries.iter().map(|(_, _, f)| *f)),
        U256::from(batch_nonce),
        Address::from(*token_contract),
        U256::from(timeout),
    )
        .abi_encode_params()
}

/// Token amounts moved by a contract call: `(contract, amount)`.
pub type Erc20Amount = (EthAddress, u128);

/// Fields of a contract call checkpoint.
pub struct LogicCallPayload<'a> {
    pub transfers: &'a [Erc20Amount],
    pub fees: &'a [Erc20Amount],
    pub logic_contract: &'a EthAddress,
    pub payload: &'a [u8],
    pub timeout: u64,
    pub invalidation_scope: &'a [u8],
    pub invalidation_nonce: u64,
}

/// Build the checkpoint payload for a contract call.
///
/// Format: `abi.encode(gravity_id, "logicCall", transfer_amounts[], transfer_tokens[],
/// fee_amounts[], fee_tokens[], logic_contract, payload, timeout, invalidation_id,
/// invalidation_nonce)`
pub fn logic_call_checkpoint_payload(gravity_id: &[u8], call: &LogicCallPayload<'_>) -> Vec<u8> {
    (
        bytes32(gravity_id),
        bytes32(METHOD_LOGIC_CALL),
        amounts(call.transfers.iter().map(|(_, a)| *a)),
        addresses(call.transfers.iter().map(|(c, _)| c)),
        amounts(call.fees.iter().map(|(_, a)| *a)),
        addresses(call.fees.iter().map(|(c, _)| c)),
        Address::from(*call.logic_contract),
        Bytes::copy_from_slice(call.payload),
        U256::from(call.timeout),
        bytes32(call.invalidation_scope),
        U256::from(call.invalidation_nonce),
    )
        .abi_encode_params()
}

/// The payload a validator signs to delegate its keys.
///
/// `nonce` is the validator account's sequence number before the delegation
/// transaction is processed, rendered as a JSON string.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateKeysSignMsg {
    pub validator_address: ValAddress,
    #[serde_as(as = "DisplayFromStr")]
    pub nonce: u64,
}

impl DelegateKeysSignMsg {
    pub fn new(validator_address: ValAddress, nonce: u64) -> Self {
        Self {
            validator_address,
            nonce,
        }
    }

    /// Canonical JSON bytes.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// The document a Cosmos account signs to authorize a transaction.
#[serde_as]
#[derive(Debug, Serialize)]
pub struct TxSignDoc<'a> {
    pub chain_id: &'a str,
    pub signer: &'a AccAddress,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
    pub msgs: &'a [Msg],
    pub fee: &'a Coins,
}

impl TxSignDoc<'_> {
    /// Canonical JSON bytes.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
