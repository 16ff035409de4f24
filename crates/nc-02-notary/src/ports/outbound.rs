//! Driven Ports (SPI - Outbound Dependencies)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{verify_signature, CryptoError};
use shared_types::{Hash, Party, PublicKey, Signature, StateRef, TimeWindow};

use crate::error::{NotaryResult, UniquenessError};

/// Who consumed a state, recorded at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumingTx {
    pub tx_id: Hash,
    /// Position of the state in the consuming transaction's inputs.
    pub input_index: u32,
    pub requesting_party: Party,
}

/// Uniqueness store for input states.
///
/// Implementations must make each `commit` a single atomic check-and-insert:
/// of several concurrent commits sharing an input, exactly one succeeds.
#[async_trait]
pub trait UniquenessProvider: Send + Sync {
    /// Reserve `inputs` for `tx_id`.
    ///
    /// Re-committing the same transaction id succeeds without changes.
    async fn commit(
        &self,
        tx_id: &Hash,
        inputs: &[StateRef],
        time_window: Option<&TimeWindow>,
        caller: &Party,
    ) -> Result<(), UniquenessError>;

    /// The transaction that consumed `state`, if any.
    async fn consumption_of(&self, state: &StateRef) -> Option<ConsumingTx>;
}

/// A notary's signature over a transaction id.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub by: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub platform_version: u32,
}

impl TransactionSignature {
    /// Bytes a notary signs for `tx_id`.
    pub fn signable_bytes(tx_id: &Hash, platform_version: u32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(36);
        bytes.extend_from_slice(tx_id);
        bytes.extend_from_slice(&platform_version.to_le_bytes());
        bytes
    }

    pub fn verify(&self, tx_id: &Hash) -> Result<(), CryptoError> {
        let bytes = Self::signable_bytes(tx_id, self.platform_version);
        verify_signature(&self.by, &bytes, &self.signature)
    }
}

/// Signing capability holding the notary's private key.
#[async_trait]
pub trait NotarySigner: Send + Sync {
    fn public_key(&self) -> PublicKey;

    async fn sign(&self, tx_id: &Hash) -> NotaryResult<TransactionSignature>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Unix milliseconds.
    fn now(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
