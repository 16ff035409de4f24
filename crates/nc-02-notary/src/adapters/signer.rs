//! Ed25519 Notary Signer
//!
//! Implements `NotarySigner` with an in-process key.

use crate::error::NotaryResult;
use crate::ports::outbound::{NotarySigner, TransactionSignature};
use async_trait::async_trait;
use shared_crypto::Ed25519KeyPair;
use shared_types::{Hash, PublicKey};

pub struct Ed25519NotarySigner {
    key: Ed25519KeyPair,
    platform_version: u32,
}

impl Ed25519NotarySigner {
    pub fn new(key: Ed25519KeyPair, platform_version: u32) -> Self {
        Self {
            key,
            platform_version,
        }
    }
}

#[async_trait]
impl NotarySigner for Ed25519NotarySigner {
    fn public_key(&self) -> PublicKey {
        *self.key.public_key().as_bytes()
    }

    async fn sign(&self, tx_id: &Hash) -> NotaryResult<TransactionSignature> {
        let bytes = TransactionSignature::signable_bytes(tx_id, self.platform_version);
        Ok(TransactionSignature {
            by: self.public_key(),
            signature: self.key.sign(&bytes),
            platform_version: self.platform_version,
        })
    }
}
