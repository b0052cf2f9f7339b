//! Transfers to Ethereum.

use super::{random_amount, OperationContext, OperationError, OperationOutput};
use crate::operations::Operation;
use crate::registry::MAX_WAIT_SECONDS;
use crate::scheduler::FutureOperation;
use gravity_core::{BankKeeper, OperationKind, SimApp};
use gravity_types::{Coin, Coins, EthAddress, Msg, MsgSendToEthereum, BOND_DENOM};
use std::time::Duration;

const KIND: OperationKind = OperationKind::SendToEthereum;

/// A random account sends part of its bonded balance to a fresh Ethereum
/// address. Every outcome, no-ops included, schedules a batch request for the
/// denom 1 to `MAX_WAIT_SECONDS` seconds later.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    let account = ctx.sample_signer(KIND)?;
    let wait = Duration::from_secs(ctx.rng.gen_range(0..MAX_WAIT_SECONDS) + 1);
    let batch_request = FutureOperation::new(
        ctx.app.block_time() + wait,
        Operation::RequestBatchTx {
            denom: Some(BOND_DENOM.to_string()),
        },
    );

    let spendable = ctx.state.spendable_coin(&account.address, BOND_DENOM).amount;
    if spendable == 0 {
        return Ok(OperationOutput::no_op(KIND, "no spendable balance")
            .with_future_ops(vec![batch_request]));
    }

    let amount = random_amount(&mut *ctx.rng, spendable);
    if amount == 0 {
        return Ok(OperationOutput::no_op(KIND, "zero amount").with_future_ops(vec![batch_request]));
    }
    let bridge_fee = random_amount(&mut *ctx.rng, spendable - amount);
    let recipient = EthAddress(ctx.rng.gen());

    let msg = Msg::SendToEthereum(MsgSendToEthereum {
        sender: account.address,
        ethereum_recipient: recipient,
        amount: Coin::new(BOND_DENOM, amount),
        bridge_fee: Coin::new(BOND_DENOM, bridge_fee),
    });
    let spent = Coins::from(Coin::new(BOND_DENOM, amount + bridge_fee));
    let outcome = ctx.deliver_with_random_fees(account, msg, &spent)?;
    Ok(OperationOutput::new(outcome).with_future_ops(vec![batch_request]))
}
