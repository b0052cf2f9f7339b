//! Key delegation.

use super::{OperationContext, OperationError, OperationOutput};
use crate::signing::CheckpointSigner;
use gravity_core::{AccountKeeper, OperationKind, SimApp};
use gravity_types::{Coins, DelegateKeysSignMsg, Msg, MsgDelegateKeys, TxError};

const KIND: OperationKind = OperationKind::DelegateKeys;

/// A validator binds itself as orchestrator together with the Ethereum
/// address of its own key, signing the binding over its current sequence.
pub(super) fn execute<R, A>(
    ctx: &mut OperationContext<'_, R, A>,
) -> Result<OperationOutput, OperationError>
where
    R: rand::Rng + ?Sized,
    A: SimApp,
{
    let account = ctx.sample_signer(KIND)?;
    let validator = account.val_address();

    let signer = CheckpointSigner::for_account(account)
        .map_err(|source| OperationError::Signing { kind: KIND, source })?;
    let sequence = ctx
        .state
        .sequence(&account.address)
        .map_err(|source| OperationError::Keeper { kind: KIND, source })?;
    let sign_bytes = DelegateKeysSignMsg::new(validator, sequence)
        .sign_bytes()
        .map_err(|e| OperationError::Encoding {
            kind: KIND,
            source: TxError::from(e),
        })?;

    let msg = Msg::DelegateKeys(MsgDelegateKeys {
        validator_address: validator,
        orchestrator_address: account.address,
        ethereum_address: signer.ethereum_address(),
        eth_signature: signer.sign_payload(&sign_bytes),
    });
    let outcome = ctx.deliver_with_random_fees(account, msg, &Coins::new())?;
    Ok(OperationOutput::new(outcome))
}
