//! Read interfaces of the chain's modules and the application seam.

use gravity_types::{
    AccAddress, BatchTx, Coin, Coins, ContractCallTx, EthAddress, Params, SendToEthereum,
    SignerSetTx, Tx, ValAddress, Validator,
};
use std::time::Duration;

/// A failed state read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeeperError {
    #[error("account {0} does not exist")]
    AccountNotFound(AccAddress),

    #[error("module parameters not set")]
    ParamsNotSet,
}

/// Account metadata.
pub trait AccountKeeper {
    /// The account's next expected transaction sequence.
    fn sequence(&self, address: &AccAddress) -> Result<u64, KeeperError>;
}

/// Balances.
pub trait BankKeeper {
    /// All coins the account can spend right now.
    fn spendable_coins(&self, address: &AccAddress) -> Coins;

    /// Spendable balance in one denomination; zero if the account holds none.
    fn spendable_coin(&self, address: &AccAddress, denom: &str) -> Coin {
        Coin::new(denom, self.spendable_coins(address).amount_of(denom))
    }
}

/// Validator records.
pub trait StakingKeeper {
    /// The validator record for `operator`, if one exists.
    fn validator(&self, operator: &ValAddress) -> Option<Validator>;
}

/// Gravity module state.
pub trait GravityKeeper {
    fn params(&self) -> Result<Params, KeeperError>;

    /// The most recent signer set awaiting confirmation.
    fn latest_signer_set_tx(&self) -> Option<SignerSetTx>;

    /// The most recent outgoing batch.
    fn latest_batch_tx(&self) -> Option<BatchTx>;

    /// The most recent outgoing contract call.
    fn latest_contract_call_tx(&self) -> Option<ContractCallTx>;

    /// Transfers not yet placed in a batch, ordered by id.
    fn unbatched_send_to_ethereums(&self) -> Vec<SendToEthereum>;

    /// Nonce of the last event the validator submitted; zero if none.
    fn last_event_nonce_by_validator(&self, operator: &ValAddress) -> u64;

    fn last_observed_ethereum_height(&self) -> u64;

    /// The Ethereum key a validator delegated to.
    fn ethereum_address_by_validator(&self, operator: &ValAddress) -> Option<EthAddress>;

    /// The ERC20 contract that represents `denom` on Ethereum.
    fn erc20_for_denom(&self, denom: &str) -> Option<EthAddress>;

    /// The Cosmos denom bridged from `contract`.
    fn denom_for_erc20(&self, contract: &EthAddress) -> Option<String>;
}

/// A complete read view of the chain.
pub trait BridgeState: AccountKeeper + BankKeeper + StakingKeeper + GravityKeeper {}

impl<T> BridgeState for T where T: AccountKeeper + BankKeeper + StakingKeeper + GravityKeeper {}

/// Transaction-level rejection, raised before any message runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliverError {
    #[error("wrong chain id: expected {expected}, got {got}")]
    WrongChainId { expected: String, got: String },

    #[error("account {0} does not exist")]
    UnknownAccount(AccAddress),

    #[error("account sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch { expected: u64, got: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient funds to pay fee {0}")]
    InsufficientFee(Coins),

    #[error("empty transaction")]
    EmptyTx,
}

/// Outcome of a transaction that passed the transaction-level checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverResult {
    /// Whether every message was applied.
    pub applied: bool,
    /// Handler output, or the reason a message was rejected.
    pub log: String,
}

impl DeliverResult {
    pub fn applied(log: impl Into<String>) -> Self {
        Self {
            applied: true,
            log: log.into(),
        }
    }

    pub fn rejected(log: impl Into<String>) -> Self {
        Self {
            applied: false,
            log: log.into(),
        }
    }
}

/// The application a simulation drives.
///
/// Operation generators read a snapshot taken with [`SimApp::state`] and
/// submit transactions through [`SimApp::deliver`]. The snapshot is not
/// updated by later deliveries.
///
/// # Example
///
/// ```ignore
/// let state = app.state();
/// let sequence = state.sequence(&account.address)?;
/// let tx = Tx::sign(chain_id, &account, sequence, vec![msg], fee)?;
/// let result = app.deliver(tx)?;
/// ```
pub trait SimApp {
    /// Point-in-time view of the chain.
    type State: BridgeState;

    fn state(&self) -> Self::State;

    /// Current block time as a duration since the Unix epoch.
    fn block_time(&self) -> Duration;

    fn block_height(&self) -> u64;

    /// Run a signed transaction against the current state.
    fn deliver(&mut self, tx: Tx) -> Result<DeliverResult, DeliverError>;

    /// Commit the current block and start the next one.
    fn end_block(&mut self);
}
