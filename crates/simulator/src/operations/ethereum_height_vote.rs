//! Ethereum height votes.

use super::{OperationContext, OperationError, OperationOutput};
use gravity_core::{GravityKeeper, OperationKind, SimApp};
use gravity_types::{Coins, Msg, MsgEthereumHeightVote};

const KIND: OperationKind = OperationKind::EthereumHeightVote;

/// Furthest a vote runs ahead of the last observed height.
const MAX_HEIGHT_STEP: u64 = 10;

/// A validator reports an Ethereum height a few blocks past the last
/// observed one.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    let account = ctx.sample_signer(KIND)?;
    let ethereum_height =
        ctx.state.last_observed_ethereum_height() + ctx.rng.gen_range(1..=MAX_HEIGHT_STEP);

    let msg = Msg::EthereumHeightVote(MsgEthereumHeightVote {
        ethereum_height,
        signer: account.address,
    });
    let outcome = ctx.deliver_with_random_fees(account, msg, &Coins::new())?;
    Ok(OperationOutput::new(outcome))
}
