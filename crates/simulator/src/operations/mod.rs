//! Operation generators.
//!
//! Each operation reads a state snapshot, samples accounts, builds one
//! gravity message and delivers it inside a transaction with random fees.
//! When nothing sensible can be built the operation reports a no-op instead.
//!
//! # Outcomes
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `Ok` with [`OperationMsg::Delivered`] | A transaction was delivered (applied or rejected by a handler) |
//! | `Ok` with [`OperationMsg::NoOp`] | Preconditions not met, nothing submitted |
//! | `Err` with [`ErrorClass::Skip`] | No eligible account; reported as a no-op |
//! | `Err` with [`ErrorClass::Recoverable`] | State read, fee room or delivery failed; the run continues |
//! | `Err` with [`ErrorClass::Fatal`] | Key or encoding failure; the run halts |

mod cancel_send_to_ethereum;
mod delegate_keys;
mod ethereum_height_vote;
mod request_batch_tx;
mod send_to_ethereum;
mod submit_ethereum_event;
mod submit_ethereum_tx_confirmation;

use crate::accounts::{random_account, random_validator};
use crate::scheduler::FutureOperation;
use gravity_core::{
    AccountKeeper, BankKeeper, DeliverError, KeeperError, OperationKind, OperationMsg, SimApp,
};
use gravity_types::{
    Coin, Coins, ConfirmationKind, Msg, MsgError, SigningError, SimAccount, Tx, TxError,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Reason reported when no sampled account is a validator.
pub const NO_VALIDATOR: &str = "no validator";

/// A simulated operation, with any parameters captured when it was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    DelegateKeys,

    /// `None` picks a confirmation kind at random.
    SubmitEthereumTxConfirmation {
        confirmation: Option<ConfirmationKind>,
    },

    SubmitEthereumEvent,

    SendToEthereum,

    /// `None` picks the denom of a random pending transfer.
    RequestBatchTx { denom: Option<String> },

    CancelSendToEthereum,

    EthereumHeightVote,
}

impl Operation {
    /// The operation registered for `kind`.
    pub fn default_for(kind: OperationKind) -> Self {
        match kind {
            OperationKind::DelegateKeys => Operation::DelegateKeys,
            OperationKind::SubmitEthereumTxConfirmation => {
                Operation::SubmitEthereumTxConfirmation { confirmation: None }
            }
            OperationKind::SubmitEthereumEvent => Operation::SubmitEthereumEvent,
            OperationKind::SendToEthereum => Operation::SendToEthereum,
            OperationKind::RequestBatchTx => Operation::RequestBatchTx { denom: None },
            OperationKind::CancelSendToEthereum => Operation::CancelSendToEthereum,
            OperationKind::EthereumHeightVote => Operation::EthereumHeightVote,
        }
    }

    /// A confirmation operation for a named confirmation kind.
    pub fn confirmation(name: &str) -> Result<Self, MsgError> {
        Ok(Operation::SubmitEthereumTxConfirmation {
            confirmation: Some(name.parse()?),
        })
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::DelegateKeys => OperationKind::DelegateKeys,
            Operation::SubmitEthereumTxConfirmation { .. } => {
                OperationKind::SubmitEthereumTxConfirmation
            }
            Operation::SubmitEthereumEvent => OperationKind::SubmitEthereumEvent,
            Operation::SendToEthereum => OperationKind::SendToEthereum,
            Operation::RequestBatchTx { .. } => OperationKind::RequestBatchTx,
            Operation::CancelSendToEthereum => OperationKind::CancelSendToEthereum,
            Operation::EthereumHeightVote => OperationKind::EthereumHeightVote,
        }
    }

    /// Run the operation against `app`.
    ///
    /// `state` is a snapshot of `app` taken before the call; it is not
    /// updated by the delivery.
    pub fn execute<R, A>(
        &self,
        rng: &mut R,
        app: &mut A,
        state: &A::State,
        accounts: &[SimAccount],
        chain_id: &str,
    ) -> Result<OperationOutput, OperationError>
    where
        R: rand::Rng + ?Sized,
        A: SimApp,
    {
        let mut ctx = OperationContext {
            rng,
            app,
            state,
            accounts,
            chain_id,
        };
        let output = match self {
            Operation::DelegateKeys => delegate_keys::execute(&mut ctx),
            Operation::SubmitEthereumTxConfirmation { confirmation } => {
                submit_ethereum_tx_confirmation::execute(&mut ctx, *confirmation)
            }
            Operation::SubmitEthereumEvent => submit_ethereum_event::execute(&mut ctx),
            Operation::SendToEthereum => send_to_ethereum::execute(&mut ctx),
            Operation::RequestBatchTx { denom } => {
                request_batch_tx::execute(&mut ctx, denom.as_deref())
            }
            Operation::CancelSendToEthereum => cancel_send_to_ethereum::execute(&mut ctx),
            Operation::EthereumHeightVote => ethereum_height_vote::execute(&mut ctx),
        }?;
        trace!(kind = %self.kind(), outcome = ?output.msg, "Executed operation");
        Ok(output)
    }
}

/// What an operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutput {
    pub msg: OperationMsg,
    /// Operations to run later.
    pub future_ops: Vec<FutureOperation>,
}

impl OperationOutput {
    pub fn new(msg: OperationMsg) -> Self {
        Self {
            msg,
            future_ops: Vec::new(),
        }
    }

    pub fn no_op(kind: OperationKind, reason: impl Into<String>) -> Self {
        Self::new(OperationMsg::no_op(kind, reason))
    }

    pub fn with_future_ops(mut self, future_ops: Vec<FutureOperation>) -> Self {
        self.future_ops = future_ops;
        self
    }
}

/// How the driver reacts to an [`OperationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected under simulation; counted as a no-op.
    Skip,
    /// Logged and counted; the run continues.
    Recoverable,
    /// The harness itself is broken; the run halts.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("{kind}: none of the sim accounts is a validator")]
    NoEligibleValidator { kind: OperationKind },

    #[error("{kind}: no sim accounts")]
    NoAccounts { kind: OperationKind },

    #[error("{kind}: unable to read state: {source}")]
    Keeper {
        kind: OperationKind,
        #[source]
        source: KeeperError,
    },

    #[error("{kind}: message doesn't leave room for fees: {spendable} < {spent}")]
    NoRoomForFees {
        kind: OperationKind,
        spendable: Coins,
        spent: Coins,
    },

    #[error("{kind}: unable to deliver tx: {source}")]
    Deliver {
        kind: OperationKind,
        #[source]
        source: DeliverError,
    },

    #[error("{kind}: invalid ethereum key: {source}")]
    Signing {
        kind: OperationKind,
        #[source]
        source: SigningError,
    },

    #[error("{kind}: unable to encode tx: {source}")]
    Encoding {
        kind: OperationKind,
        #[source]
        source: TxError,
    },
}

impl OperationError {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationError::NoEligibleValidator { kind }
            | OperationError::NoAccounts { kind }
            | OperationError::Keeper { kind, .. }
            | OperationError::NoRoomForFees { kind, .. }
            | OperationError::Deliver { kind, .. }
            | OperationError::Signing { kind, .. }
            | OperationError::Encoding { kind, .. } => *kind,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            OperationError::NoEligibleValidator { .. } | OperationError::NoAccounts { .. } => {
                ErrorClass::Skip
            }
            OperationError::Keeper { .. }
            | OperationError::NoRoomForFees { .. }
            | OperationError::Deliver { .. } => ErrorClass::Recoverable,
            OperationError::Signing { .. } | OperationError::Encoding { .. } => ErrorClass::Fatal,
        }
    }

    /// The no-op outcome reported alongside this error.
    pub fn no_op(&self) -> OperationMsg {
        let reason = match self {
            OperationError::NoEligibleValidator { .. } => NO_VALIDATOR,
            OperationError::NoAccounts { .. } => "no account",
            OperationError::Keeper { .. } => "unable to read state",
            OperationError::NoRoomForFees { .. } => "message doesn't leave room for fees",
            OperationError::Deliver { .. } => "unable to deliver tx",
            OperationError::Signing { .. } => "unable to sign",
            OperationError::Encoding { .. } => "unable to encode tx",
        };
        OperationMsg::no_op(self.kind(), reason)
    }
}

/// Everything a generator needs for one invocation.
pub(crate) struct OperationContext<'a, R: ?Sized, A: SimApp> {
    pub rng: &'a mut R,
    pub app: &'a mut A,
    pub state: &'a A::State,
    pub accounts: &'a [SimAccount],
    pub chain_id: &'a str,
}

impl<'a, R: rand::Rng + ?Sized, A: SimApp> OperationContext<'a, R, A> {
    /// The account that signs a `kind` operation: a validator when the kind
    /// requires one, otherwise any account in the pool.
    pub fn sample_signer(&mut self, kind: OperationKind) -> Result<&'a SimAccount, OperationError> {
        let accounts = self.accounts;
        if kind.requires_validator() {
            random_validator(&mut *self.rng, self.state, accounts)
                .ok_or(OperationError::NoEligibleValidator { kind })
        } else {
            random_account(&mut *self.rng, accounts).ok_or(OperationError::NoAccounts { kind })
        }
    }

    /// Wrap `msg` in a transaction from `account` with random fees and deliver it.
    ///
    /// `spent` is what the message itself takes from the account; fees are
    /// drawn from what remains.
    pub fn deliver_with_random_fees(
        &mut self,
        account: &SimAccount,
        msg: Msg,
        spent: &Coins,
    ) -> Result<OperationMsg, OperationError> {
        let kind = OperationKind::of_msg(&msg);
        let spendable = self.state.spendable_coins(&account.address);
        let coins = spendable
            .checked_sub_all(spent)
            .ok_or_else(|| OperationError::NoRoomForFees {
                kind,
                spendable: spendable.clone(),
                spent: spent.clone(),
            })?;
        let fees = random_fees(&mut *self.rng, &coins);

        let sequence = self
            .state
            .sequence(&account.address)
            .map_err(|source| OperationError::Keeper { kind, source })?;
        let tx = Tx::sign(self.chain_id, account, sequence, vec![msg.clone()], fees)
            .map_err(|source| OperationError::Encoding { kind, source })?;

        let result = self
            .app
            .deliver(tx)
            .map_err(|source| OperationError::Deliver { kind, source })?;
        Ok(OperationMsg::delivered(msg, result.applied, result.log))
    }
}

/// A random amount in `0..=max`: zero and `max` each one time in ten,
/// otherwise uniform below `max`.
pub fn random_amount<R: rand::Rng + ?Sized>(rng: &mut R, max: u128) -> u128 {
    if max == 0 {
        return 0;
    }
    match rng.gen_range(0..10) {
        0 => 0,
        1 => max,
        _ => rng.gen_range(0..max),
    }
}

/// Random fees paid from `spendable`: one random denom with a positive
/// balance and a random amount of it. May be empty.
pub fn random_fees<R: rand::Rng + ?Sized>(rng: &mut R, spendable: &Coins) -> Coins {
    let positive: Vec<&Coin> = spendable.iter().filter(|c| !c.is_zero()).collect();
    if positive.is_empty() {
        return Coins::new();
    }
    let coin = positive[rng.gen_range(0..positive.len())];
    let amount = random_amount(rng, coin.amount);
    if amount == 0 {
        return Coins::new();
    }
    Coins::from(Coin::new(coin.denom.clone(), amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_amount_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(random_amount(&mut rng, 0), 0);

        let mut saw_zero = false;
        let mut saw_max = false;
        for _ in 0..1_000 {
            let amount = random_amount(&mut rng, 50);
            assert!(amount <= 50);
            saw_zero |= amount == 0;
            saw_max |= amount == 50;
        }
        assert!(saw_zero && saw_max);
    }

    #[test]
    fn test_random_fees_stay_within_balance() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let spendable = Coins::from_coins([Coin::new("stake", 100), Coin::new("uatom", 3)]);
        for _ in 0..500 {
            let fees = random_fees(&mut rng, &spendable);
            assert!(fees.len() <= 1);
            assert!(spendable.checked_sub_all(&fees).is_some());
        }
        assert!(random_fees(&mut rng, &Coins::new()).is_empty());
    }

    #[test]
    fn test_operation_kinds_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(Operation::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_confirmation_by_name() {
        assert_eq!(
            Operation::confirmation("BatchTx").unwrap(),
            Operation::SubmitEthereumTxConfirmation {
                confirmation: Some(ConfirmationKind::BatchTx)
            }
        );
        assert!(matches!(
            Operation::confirmation("ValsetTx"),
            Err(MsgError::UnknownConfirmationKind(_))
        ));
    }

    #[test]
    fn test_error_classes() {
        let kind = OperationKind::DelegateKeys;
        let skip = OperationError::NoEligibleValidator { kind };
        assert_eq!(skip.class(), ErrorClass::Skip);
        assert_eq!(skip.no_op().reason(), Some(NO_VALIDATOR));

        let recoverable = OperationError::NoRoomForFees {
            kind,
            spendable: Coins::new(),
            spent: Coins::new(),
        };
        assert_eq!(recoverable.class(), ErrorClass::Recoverable);

        let keeper = OperationError::Keeper {
            kind,
            source: KeeperError::ParamsNotSet,
        };
        assert_eq!(keeper.class(), ErrorClass::Recoverable);
        assert_eq!(keeper.no_op().reason(), Some("unable to read state"));

        let fatal = OperationError::Signing {
            kind,
            source: SigningError::VerificationFailed,
        };
        assert_eq!(fatal.class(), ErrorClass::Fatal);
    }
}
