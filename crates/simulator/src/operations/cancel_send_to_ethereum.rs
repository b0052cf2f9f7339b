//! Cancellation of pending transfers.

use super::{OperationContext, OperationError, OperationOutput};
use gravity_core::{GravityKeeper, OperationKind, SimApp};
use gravity_types::{find_account, Coins, Msg, MsgCancelSendToEthereum, SimAccount};

const KIND: OperationKind = OperationKind::CancelSendToEthereum;

/// The sender of a random unbatched transfer cancels it.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    if ctx.accounts.is_empty() {
        return Err(OperationError::NoAccounts { kind: KIND });
    }
    let cancellable: Vec<(u64, &SimAccount)> = ctx
        .state
        .unbatched_send_to_ethereums()
        .iter()
        .filter_map(|tx| find_account(ctx.accounts, &tx.sender).map(|a| (tx.id, a)))
        .collect();
    if cancellable.is_empty() {
        return Ok(OperationOutput::no_op(KIND, "no unbatched transfer to cancel"));
    }
    let (id, sender) = cancellable[ctx.rng.gen_range(0..cancellable.len())];

    let msg = Msg::CancelSendToEthereum(MsgCancelSendToEthereum {
        id,
        sender: sender.address,
    });
    let outcome = ctx.deliver_with_random_fees(sender, msg, &Coins::new())?;
    Ok(OperationOutput::new(outcome))
}
