//! # Notary Client Flow (requester side)
//!
//! Signs a notarisation request for a transaction, sends it to the notary
//! and checks the answer. A signature is only accepted if it was made by the
//! session's counterparty over the transaction's id.

use async_trait::async_trait;
use nc_01_flow_engine::{FlowContext, FlowLogic, FlowSession};
use shared_crypto::Ed25519KeyPair;
use shared_types::{short_hex, Hash, Party};
use std::sync::Arc;
use tracing::{debug, info};

use super::NotarisationResponse;
use crate::domain::{CoreTransaction, NotarisationPayload, NotarisationRequest};
use crate::error::{NotaryError, NotaryResult};
use crate::ports::outbound::TransactionSignature;

pub const REQUESTING: &str = "Requesting signature by notary service";
pub const VALIDATING: &str = "Validating response from notary service";

/// Requests the counterparty notary's signature over `transaction`.
pub struct NotaryClientFlow {
    session: FlowSession,
    transaction: CoreTransaction,
    signing_key: Arc<Ed25519KeyPair>,
    platform_version: u32,
}

impl NotaryClientFlow {
    pub fn new(
        session: FlowSession,
        transaction: CoreTransaction,
        signing_key: Arc<Ed25519KeyPair>,
        platform_version: u32,
    ) -> Self {
        Self {
            session,
            transaction,
            signing_key,
            platform_version,
        }
    }
}

/// Accept a notary response for `tx_id` only if `notary` signed it.
pub fn validate_response(
    response: NotarisationResponse,
    tx_id: &Hash,
    notary: &Party,
) -> NotaryResult<TransactionSignature> {
    let signature = match response {
        NotarisationResponse::Signed(signature) => signature,
        NotarisationResponse::Rejected(error) => return Err(error),
    };

    if signature.by != notary.owning_key {
        return Err(NotaryError::AuthenticationFailure {
            reason: format!(
                "response signed by key {}, not by notary {}",
                short_hex(&signature.by),
                notary.name
            ),
        });
    }
    signature
        .verify(tx_id)
        .map_err(|e| NotaryError::AuthenticationFailure {
            reason: format!("notary signature does not cover transaction: {}", e),
        })?;
    Ok(signature)
}

#[async_trait]
impl FlowLogic for NotaryClientFlow {
    type Output = TransactionSignature;
    type Error = NotaryError;

    fn flow_name(&self) -> &'static str {
        "NotaryClientFlow"
    }

    async fn call(mut self, ctx: FlowContext) -> Result<TransactionSignature, NotaryError> {
        ctx.progress().set_current_step(REQUESTING);

        let tx_id = self.transaction.id();
        let request = NotarisationRequest::for_transaction(&self.transaction)?;
        let payload = NotarisationPayload {
            request_signature: request.sign(&self.signing_key, self.platform_version)?,
            transaction: self.transaction.clone(),
        };
        debug!(
            run_id = %ctx.run_id(),
            tx_id = %short_hex(&tx_id),
            tx_type = self.transaction.type_name(),
            "Sending notarisation payload"
        );

        let response = ctx
            .send_and_receive::<_, NotarisationResponse>(&mut self.session, &payload)
            .await?;

        ctx.progress().set_current_step(VALIDATING);
        let notary = self.session.counterparty().clone();
        let signature = response.validate(|r| validate_response(r, &tx_id, &notary))?;

        info!(tx_id = %short_hex(&tx_id), notary = %notary, "Notary signature received");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Ed25519NotarySigner;
    use crate::ports::outbound::NotarySigner;
    use shared_types::StateRef;

    fn notary() -> (Ed25519NotarySigner, Party) {
        let key = Ed25519KeyPair::from_seed([7; 32]);
        let party = Party::new("O=Notary", *key.public_key().as_bytes());
        (Ed25519NotarySigner::new(key, 4), party)
    }

    #[tokio::test]
    async fn test_signed_response_is_accepted() {
        let (signer, party) = notary();
        let signature = signer.sign(&[1; 32]).await.unwrap();

        let accepted =
            validate_response(NotarisationResponse::Signed(signature.clone()), &[1; 32], &party)
                .unwrap();
        assert_eq!(accepted, signature);
    }

    #[tokio::test]
    async fn test_signature_for_other_transaction_is_refused() {
        let (signer, party) = notary();
        let signature = signer.sign(&[1; 32]).await.unwrap();

        assert!(matches!(
            validate_response(NotarisationResponse::Signed(signature), &[2; 32], &party),
            Err(NotaryError::AuthenticationFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_signature_by_other_key_is_refused() {
        let (_, party) = notary();
        let impostor = Ed25519NotarySigner::new(Ed25519KeyPair::from_seed([8; 32]), 4);
        let signature = impostor.sign(&[1; 32]).await.unwrap();

        let err = validate_response(NotarisationResponse::Signed(signature), &[1; 32], &party)
            .unwrap_err();
        assert!(err.to_string().contains("O=Notary"));
    }

    #[test]
    fn test_rejection_is_returned_as_error() {
        let (_, party) = notary();
        let rejection = NotaryError::Conflict {
            tx_id: [1; 32],
            conflicts: vec![crate::error::StateConflict {
                state_ref: StateRef::new([3; 32], 0),
                consuming_tx_hash: [4; 32],
            }],
        };

        assert_eq!(
            validate_response(
                NotarisationResponse::Rejected(rejection.clone()),
                &[1; 32],
                &party
            ),
            Err(rejection)
        );
    }
}
