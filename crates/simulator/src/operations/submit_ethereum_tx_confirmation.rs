//! Confirmations of outgoing transactions.

use super::{OperationContext, OperationError, OperationOutput};
use crate::signing::CheckpointSigner;
use gravity_core::{GravityKeeper, OperationKind, SimApp};
use gravity_types::{
    BatchTxConfirmation, Coins, ConfirmationKind, ContractCallTxConfirmation,
    EthereumTxConfirmation, Msg, MsgSubmitEthereumTxConfirmation, OutgoingTx,
    SignerSetTxConfirmation,
};

const KIND: OperationKind = OperationKind::SubmitEthereumTxConfirmation;

/// A validator signs the checkpoint of the latest outgoing transaction of
/// one kind. With no such transaction pending there is nothing to confirm.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
    confirmation: Option<ConfirmationKind>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    let account = ctx.sample_signer(KIND)?;
    let kind = match confirmation {
        Some(kind) => kind,
        None => ConfirmationKind::ALL[ctx.rng.gen_range(0..ConfirmationKind::ALL.len())],
    };

    let params = ctx
        .state
        .params()
        .map_err(|source| OperationError::Keeper { kind: KIND, source })?;
    let gravity_id = params.gravity_id.as_bytes();
    let signer = CheckpointSigner::for_account(account)
        .map_err(|source| OperationError::Signing { kind: KIND, source })?;
    let ethereum_signer = signer.ethereum_address();

    let confirmation = match kind {
        ConfirmationKind::SignerSetTx => {
            let Some(set) = ctx.state.latest_signer_set_tx() else {
                return Ok(OperationOutput::no_op(KIND, "no signer set tx to confirm"));
            };
            EthereumTxConfirmation::SignerSetTx(SignerSetTxConfirmation {
                signer_set_nonce: set.nonce,
                ethereum_signer,
                signature: signer.sign_payload(&set.checkpoint_payload(gravity_id)),
            })
        }
        ConfirmationKind::BatchTx => {
            let Some(batch) = ctx.state.latest_batch_tx() else {
                return Ok(OperationOutput::no_op(KIND, "no batch tx to confirm"));
            };
            EthereumTxConfirmation::BatchTx(BatchTxConfirmation {
                token_contract: batch.token_contract,
                batch_nonce: batch.batch_nonce,
                ethereum_signer,
                signature: signer.sign_payload(&batch.checkpoint_payload(gravity_id)),
            })
        }
        ConfirmationKind::ContractCallTx => {
            let Some(call) = ctx.state.latest_contract_call_tx() else {
                return Ok(OperationOutput::no_op(KIND, "no contract call tx to confirm"));
            };
            EthereumTxConfirmation::ContractCallTx(ContractCallTxConfirmation {
                signature: signer.sign_payload(&call.checkpoint_payload(gravity_id)),
                invalidation_scope: call.invalidation_scope,
                invalidation_nonce: call.invalidation_nonce,
                ethereum_signer,
            })
        }
    };

    let msg = Msg::SubmitEthereumTxConfirmation(MsgSubmitEthereumTxConfirmation {
        confirmation,
        signer: account.address,
    });
    let outcome = ctx.deliver_with_random_fees(account, msg, &Coins::new())?;
    Ok(OperationOutput::new(outcome))
}
