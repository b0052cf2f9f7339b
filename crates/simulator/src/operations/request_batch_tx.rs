//! Batch requests.

use super::{OperationContext, OperationError, OperationOutput};
use gravity_core::{GravityKeeper, OperationKind, SimApp};
use gravity_types::{Coins, Msg, MsgRequestBatchTx};

const KIND: OperationKind = OperationKind::RequestBatchTx;

/// A validator asks for the pending transfers of one denom to be batched.
///
/// Without a captured denom, the denom of a random pending transfer is used.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
    denom: Option<&str>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    let account = ctx.sample_signer(KIND)?;
    let pending = ctx.state.unbatched_send_to_ethereums();

    let denom = match denom {
        Some(denom) => denom.to_string(),
        None => {
            if pending.is_empty() {
                return Ok(OperationOutput::no_op(KIND, "no unbatched transfers"));
            }
            let pick = &pending[ctx.rng.gen_range(0..pending.len())];
            match ctx.state.denom_for_erc20(&pick.erc20_token.contract) {
                Some(denom) => denom,
                None => return Ok(OperationOutput::no_op(KIND, "token is not bridged")),
            }
        }
    };

    let Some(contract) = ctx.state.erc20_for_denom(&denom) else {
        return Ok(OperationOutput::no_op(KIND, "denom is not bridged"));
    };
    if !pending.iter().any(|tx| tx.erc20_token.contract == contract) {
        return Ok(OperationOutput::no_op(KIND, "no unbatched transfers"));
    }

    let msg = Msg::RequestBatchTx(MsgRequestBatchTx {
        denom,
        signer: account.address,
    });
    let outcome = ctx.deliver_with_random_fees(account, msg, &Coins::new())?;
    Ok(OperationOutput::new(outcome))
}
