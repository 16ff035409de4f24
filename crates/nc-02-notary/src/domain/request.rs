//! # Request Authentication
//!
//! A requester proves it asked for this notarisation by signing a
//! [`NotarisationRequest`]: the transaction id plus the inputs it wants
//! consumed. The notary recomputes the request from the transaction it was
//! sent and checks the signature over that, so a signature made for other
//! inputs or another transaction never verifies.
//!
//! Authentication runs before any uniqueness check. An unauthenticated
//! request never reaches the uniqueness store.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{verify_signature, Ed25519KeyPair};
use shared_types::{short_hex, Hash, Party, PublicKey, Signature, StateRef};

use super::transactions::CoreTransaction;
use crate::error::{NotaryError, NotaryResult};

/// What the requester signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarisationRequest {
    pub input_state_refs: Vec<StateRef>,
    pub transaction_id: Hash,
}

impl NotarisationRequest {
    pub fn new(input_state_refs: Vec<StateRef>, transaction_id: Hash) -> Self {
        Self {
            input_state_refs,
            transaction_id,
        }
    }

    /// The request implied by `transaction`'s visible inputs and id.
    pub fn for_transaction(transaction: &CoreTransaction) -> NotaryResult<Self> {
        Ok(Self::new(transaction.inputs()?, transaction.id()))
    }

    /// Canonical bytes covered by the request signature.
    pub fn signable_bytes(&self) -> NotaryResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| NotaryError::TransactionInvalid {
            reason: format!("cannot encode notarisation request: {}", e),
        })
    }

    /// Sign this request as `key`'s owner.
    pub fn sign(
        &self,
        key: &Ed25519KeyPair,
        platform_version: u32,
    ) -> NotaryResult<NotarisationRequestSignature> {
        Ok(NotarisationRequestSignature {
            by: *key.public_key().as_bytes(),
            signature: key.sign(&self.signable_bytes()?),
            platform_version,
        })
    }
}

/// Signature over a [`NotarisationRequest`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarisationRequestSignature {
    pub by: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub platform_version: u32,
}

/// What a requester sends to the notary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarisationPayload {
    pub transaction: CoreTransaction,
    pub request_signature: NotarisationRequestSignature,
}

/// Check that `signature` was made by `expected_signer` over `request`.
pub fn validate_request(
    request: &NotarisationRequest,
    signature: &NotarisationRequestSignature,
    expected_signer: &Party,
) -> NotaryResult<()> {
    if signature.by != expected_signer.owning_key {
        return Err(NotaryError::AuthenticationFailure {
            reason: format!(
                "request signed by key {}, expected {} ({})",
                short_hex(&signature.by),
                short_hex(&expected_signer.owning_key),
                expected_signer.name
            ),
        });
    }

    let bytes = request.signable_bytes()?;
    verify_signature(&signature.by, &bytes, &signature.signature).map_err(|e| {
        NotaryError::AuthenticationFailure {
            reason: format!("signature does not cover the notarisation request: {}", e),
        }
    })
}
