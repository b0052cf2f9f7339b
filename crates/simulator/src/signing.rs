//! Checkpoint signing.
//!
//! A checkpoint is signed the way an Ethereum wallet signs a 32-byte
//! message: `keccak256(payload)` is prefixed with the Ethereum signed-message
//! header, hashed again and signed with a recoverable ECDSA key. The result
//! is the 65-byte `r || s || v` encoding the bridge contract accepts.

use gravity_types::{
    new_ethereum_signature, validate_ethereum_signature, EthAddress, EthSignature, Hash,
    PrivateKey, SigningError, SimAccount,
};

/// Signs checkpoint payloads with one account's Ethereum key.
pub struct CheckpointSigner {
    key: PrivateKey,
    address: EthAddress,
}

impl CheckpointSigner {
    /// Build a signer from raw private key bytes.
    ///
    /// Malformed key material is an error; callers treat it as a broken fixture.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let key = PrivateKey::from_bytes(bytes)?;
        Ok(Self {
            address: key.eth_address(),
            key,
        })
    }

    /// Convert a simulated account's key into its Ethereum signing key.
    pub fn for_account(account: &SimAccount) -> Result<Self, SigningError> {
        Self::from_bytes(&account.priv_key.to_bytes())
    }

    /// The Ethereum address signatures recover to.
    pub fn ethereum_address(&self) -> EthAddress {
        self.address
    }

    /// Sign `keccak256(payload)`.
    pub fn sign_payload(&self, payload: &[u8]) -> EthSignature {
        self.sign_hash(&Hash::from_bytes(payload))
    }

    /// Sign an already computed digest.
    pub fn sign_hash(&self, hash: &Hash) -> EthSignature {
        new_ethereum_signature(hash, &self.key)
    }
}

/// Check a checkpoint signature the way the bridge validates it.
pub fn verify_checkpoint_signature(
    payload: &[u8],
    signature: &EthSignature,
    signer: &EthAddress,
) -> Result<(), SigningError> {
    validate_ethereum_signature(&Hash::from_bytes(payload), signature, signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_types::{random_accounts, OutgoingTx, SignerSetTx, ETH_SIGNATURE_LEN};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_signature_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for account in random_accounts(&mut rng.clone(), 8) {
            let signer = CheckpointSigner::for_account(&account).unwrap();
            let len = rng.gen_range(1..256);
            let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();

            let signature = signer.sign_payload(&payload);
            assert_eq!(signature.len(), ETH_SIGNATURE_LEN);
            verify_checkpoint_signature(&payload, &signature, &signer.ethereum_address())
                .unwrap();

            let mut tampered = payload.clone();
            let idx = rng.gen_range(0..tampered.len());
            tampered[idx] ^= 0x01;
            assert!(
                verify_checkpoint_signature(&tampered, &signature, &signer.ethereum_address())
                    .is_err()
            );
        }
    }

    #[test]
    fn test_signer_matches_account_address() {
        let account = random_accounts(&mut ChaCha8Rng::seed_from_u64(5), 1).remove(0);
        let signer = CheckpointSigner::for_account(&account).unwrap();
        assert_eq!(signer.ethereum_address(), account.eth_address);
    }

    #[test]
    fn test_signs_signer_set_checkpoint() {
        let account = random_accounts(&mut ChaCha8Rng::seed_from_u64(9), 1).remove(0);
        let signer = CheckpointSigner::for_account(&account).unwrap();
        let set = SignerSetTx {
            nonce: 4,
            height: 10,
            signers: vec![],
        };
        let payload = set.checkpoint_payload(b"gravity-sim");

        let signature = signer.sign_payload(&payload);
        validate_ethereum_signature(
            &set.checkpoint(b"gravity-sim"),
            &signature,
            &account.eth_address,
        )
        .unwrap();
    }

    #[test]
    fn test_malformed_key_rejected() {
        assert!(matches!(
            CheckpointSigner::from_bytes(&[0u8; 32]),
            Err(SigningError::InvalidPrivateKey(_))
        ));
        assert!(CheckpointSigner::from_bytes(&[1u8; 7]).is_err());
    }
}
