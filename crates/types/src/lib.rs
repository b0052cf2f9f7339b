//! Core types for the Gravity bridge simulator.
//!
//! This crate holds everything that is pure data or pure computation:
//!
//! - **Identity**: [`AccAddress`], [`ValAddress`], [`EthAddress`], [`SimAccount`]
//! - **Value**: [`Coin`], [`Coins`]
//! - **Bridge state**: [`SignerSetTx`], [`BatchTx`], [`ContractCallTx`] and their checkpoints
//! - **Messages**: [`Msg`] and the confirmation/event envelopes, [`Tx`]
//! - **Crypto**: Keccak [`Hash`], secp256k1 keys, Ethereum signatures
//! - **Governance**: [`CommunityPoolEthereumSpendProposal`], [`ProposalRegistry`]

mod account;
mod address;
mod coin;
mod crypto;
mod hash;
mod msgs;
mod proposal;
pub mod signing;
mod state;
mod tx;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use account::{find_account, random_accounts, SimAccount};
pub use address::{
    AccAddress, AddressError, EthAddress, ValAddress, ACCOUNT_PREFIX, ADDRESS_LEN,
    VALIDATOR_PREFIX,
};
pub use coin::{Coin, Coins, BOND_DENOM};
pub use crypto::{
    ethereum_signed_hash, new_ethereum_signature, recover_ethereum_signer,
    validate_ethereum_signature, EthSignature, PrivateKey, PublicKey, SigningError, TxSignature,
    ETH_SIGNATURE_LEN,
};
pub use hash::{Hash, HexError};
pub use msgs::{
    BatchExecutedEvent, BatchTxConfirmation, ConfirmationKind, ContractCallExecutedEvent,
    ContractCallTxConfirmation, Erc20DeployedEvent, EthereumEvent, EthereumTxConfirmation, Msg,
    MsgCancelSendToEthereum, MsgDelegateKeys, MsgError, MsgEthereumHeightVote,
    MsgRequestBatchTx, MsgSendToEthereum, MsgSubmitEthereumEvent,
    MsgSubmitEthereumTxConfirmation, SendToCosmosEvent, SignerSetTxConfirmation,
    SignerSetTxExecutedEvent, TYPE_MSG_CANCEL_SEND_TO_ETHEREUM, TYPE_MSG_DELEGATE_KEYS,
    TYPE_MSG_ETHEREUM_HEIGHT_VOTE, TYPE_MSG_REQUEST_BATCH_TX, TYPE_MSG_SEND_TO_ETHEREUM,
    TYPE_MSG_SUBMIT_ETHEREUM_EVENT, TYPE_MSG_SUBMIT_ETHEREUM_TX_CONFIRMATION,
};
pub use proposal::{
    register_gravity_proposals, CommunityPoolEthereumSpendProposal, ProposalError,
    ProposalRegistry, PROPOSAL_TYPE_COMMUNITY_POOL_ETHEREUM_SPEND,
};
pub use signing::DelegateKeysSignMsg;
pub use state::{
    BatchTx, ContractCallTx, Erc20Token, EthereumSigner, OutgoingTx, Params, SendToEthereum,
    SignerSetTx, Validator,
};
pub use tx::{Tx, TxError};
