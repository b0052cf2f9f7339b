//! Signed Cosmos transactions.

use crate::account::SimAccount;
use crate::address::AccAddress;
use crate::coin::Coins;
use crate::crypto::{PublicKey, TxSignature};
use crate::msgs::Msg;
use crate::signing::TxSignDoc;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("failed to encode sign bytes: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("public key does not belong to signer {0}")]
    PubKeyMismatch(AccAddress),

    #[error("invalid transaction signature")]
    InvalidSignature,
}

/// A transaction carrying one or more messages from a single signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub chain_id: String,
    pub signer: AccAddress,
    pub sequence: u64,
    pub msgs: Vec<Msg>,
    pub fee: Coins,
    pub pub_key: PublicKey,
    pub signature: TxSignature,
}

impl Tx {
    /// Build and sign a transaction for `account` at `sequence`.
    pub fn sign(
        chain_id: &str,
        account: &SimAccount,
        sequence: u64,
        msgs: Vec<Msg>,
        fee: Coins,
    ) -> Result<Self, TxError> {
        let sign_bytes = TxSignDoc {
            chain_id,
            signer: &account.address,
            sequence,
            msgs: &msgs,
            fee: &fee,
        }
        .sign_bytes()?;
        let signature = account.priv_key.sign_tx_bytes(&sign_bytes);

        Ok(Self {
            chain_id: chain_id.to_string(),
            signer: account.address,
            sequence,
            msgs,
            fee,
            pub_key: account.pub_key,
            signature,
        })
    }

    pub fn sign_bytes(&self) -> Result<Vec<u8>, TxError> {
        Ok(TxSignDoc {
            chain_id: &self.chain_id,
            signer: &self.signer,
            sequence: self.sequence,
            msgs: &self.msgs,
            fee: &self.fee,
        }
        .sign_bytes()?)
    }

    /// Check that `pub_key` belongs to `signer` and produced `signature`.
    pub fn verify_signature(&self) -> Result<(), TxError> {
        if self.pub_key.address() != self.signer {
            return Err(TxError::PubKeyMismatch(self.signer));
        }
        if !self
            .pub_key
            .verify_tx_bytes(&self.sign_bytes()?, &self.signature)
        {
            return Err(TxError::InvalidSignature);
        }
        Ok(())
    }
}
