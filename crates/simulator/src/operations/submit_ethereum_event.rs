//! Ethereum event attestations.

use super::{OperationContext, OperationError, OperationOutput};
use crate::accounts::random_account;
use gravity_core::{GravityKeeper, OperationKind, SimApp};
use gravity_types::{
    BatchExecutedEvent, Coins, ContractCallExecutedEvent, Erc20DeployedEvent, EthAddress,
    EthereumEvent, Msg, MsgSubmitEthereumEvent, SendToCosmosEvent, SignerSetTxExecutedEvent,
    BOND_DENOM,
};

const KIND: OperationKind = OperationKind::SubmitEthereumEvent;

/// Upper bound on amounts bridged in from Ethereum.
const MAX_SEND_TO_COSMOS: u128 = 1_000;

/// Event shapes a generator can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventShape {
    SendToCosmos,
    BatchExecuted,
    ContractCallExecuted,
    Erc20Deployed,
    SignerSetTxExecuted,
}

/// A validator attests to an event on the bridge contract.
///
/// The event nonce is always one past the validator's last attested nonce.
/// Only shapes that refer to something in the current state are drawn.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    let account = ctx.sample_signer(KIND)?;
    let validator = account.val_address();
    let event_nonce = ctx.state.last_event_nonce_by_validator(&validator) + 1;
    let ethereum_height =
        ctx.state.last_observed_ethereum_height().max(1) + ctx.rng.gen_range(0..10);

    let bond_contract = ctx.state.erc20_for_denom(BOND_DENOM);
    let batch = ctx.state.latest_batch_tx();
    let call = ctx.state.latest_contract_call_tx();
    let signer_set = ctx.state.latest_signer_set_tx();

    let mut shapes = vec![EventShape::Erc20Deployed];
    if bond_contract.is_some() {
        shapes.push(EventShape::SendToCosmos);
    }
    if batch.is_some() {
        shapes.push(EventShape::BatchExecuted);
    }
    if call.is_some() {
        shapes.push(EventShape::ContractCallExecuted);
    }
    if signer_set.is_some() {
        shapes.push(EventShape::SignerSetTxExecuted);
    }
    let shape = shapes[ctx.rng.gen_range(0..shapes.len())];

    let event = match (shape, bond_contract, batch, call, signer_set) {
        (EventShape::SendToCosmos, Some(token_contract), ..) => {
            let receiver = random_account(&mut *ctx.rng, ctx.accounts)
                .ok_or(OperationError::NoAccounts { kind: KIND })?;
            EthereumEvent::SendToCosmos(SendToCosmosEvent {
                event_nonce,
                token_contract,
                amount: ctx.rng.gen_range(1..=MAX_SEND_TO_COSMOS),
                ethereum_sender: EthAddress(ctx.rng.gen()),
                cosmos_receiver: receiver.address,
                ethereum_height,
            })
        }
        (EventShape::BatchExecuted, _, Some(batch), ..) => {
            EthereumEvent::BatchExecuted(BatchExecutedEvent {
                event_nonce,
                token_contract: batch.token_contract,
                batch_nonce: batch.batch_nonce,
                ethereum_height,
            })
        }
        (EventShape::ContractCallExecuted, _, _, Some(call), _) => {
            EthereumEvent::ContractCallExecuted(ContractCallExecutedEvent {
                event_nonce,
                invalidation_scope: call.invalidation_scope,
                invalidation_nonce: call.invalidation_nonce,
                ethereum_height,
            })
        }
        (EventShape::SignerSetTxExecuted, .., Some(set)) => {
            EthereumEvent::SignerSetTxExecuted(SignerSetTxExecutedEvent {
                event_nonce,
                signer_set_tx_nonce: set.nonce,
                ethereum_height,
                members: set.signers,
            })
        }
        _ => {
            let n: u16 = ctx.rng.gen();
            EthereumEvent::Erc20Deployed(Erc20DeployedEvent {
                event_nonce,
                cosmos_denom: format!("simcoin{n}"),
                token_contract: EthAddress(ctx.rng.gen()),
                erc20_name: format!("Sim Coin {n}"),
                erc20_symbol: format!("SIM{n}"),
                erc20_decimals: 6,
                ethereum_height,
            })
        }
    };

    let msg = Msg::SubmitEthereumEvent(MsgSubmitEthereumEvent {
        event,
        signer: account.address,
    });
    let outcome = ctx.deliver_with_random_fees(account, msg, &Coins::new())?;
    Ok(OperationOutput::new(outcome))
}
