//! # Non-Validating Notary Flow (service side)
//!
//! One run serves one notarisation request over one session.
//!
//! ```text
//! [AWAIT_PAYLOAD] ──→ [AUTHENTICATE] ──→ [EXTRACT_FACTS] ──→ [CHECK_UNIQUENESS] ──→ [RESPOND] ──→ [COMMITTED]
//!        │                  │                   │                    │
//!        │                  └───────────────────┴────────────────────┴──→ [REJECTED] ──response──→ requester
//!        └──peer gone──→ [REJECTED] (nothing sent)
//! ```
//!
//! The uniqueness provider is called at most once per run and never retried.
//! The current state is recorded as the flow's checkpoint snapshot at every
//! transition.

use async_trait::async_trait;
use nc_01_flow_engine::{FlowContext, FlowLogic, FlowSession};
use serde::{Deserialize, Serialize};
use shared_types::{short_hex, Hash, Party, TimeWindow};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::NotarisationResponse;
use crate::domain::{
    extract_parts, validate_request, NotarisationPayload, NotarisationRequest, TransactionParts,
};
use crate::error::{NotaryError, NotaryResult, UniquenessError};
use crate::metrics;
use crate::ports::outbound::{NotarySigner, TimeSource, TransactionSignature, UniquenessProvider};
use crate::service::NotaryConfig;

pub const RECEIVING: &str = "Receiving notarisation payload";
pub const AUTHENTICATING: &str = "Authenticating request";
pub const EXTRACTING: &str = "Extracting transaction facts";
pub const CHECKING_UNIQUENESS: &str = "Checking input uniqueness";
pub const RESPONDING: &str = "Sending notary response";

/// Position of a notarisation run, recorded at every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotaryFlowState {
    AwaitPayload,
    Authenticate { tx_id: Hash },
    ExtractFacts { tx_id: Hash },
    CheckUniqueness { parts: TransactionParts },
    Respond { tx_id: Hash },
    Committed { tx_id: Hash },
    Rejected { error: NotaryError },
}

impl NotaryFlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed { .. } | Self::Rejected { .. })
    }
}

/// Whether `now` lies in `window`, widened by `tolerance` on both sides.
pub fn within_time_window(window: &TimeWindow, now: u64, tolerance: u64) -> bool {
    window.widened(tolerance).contains(now)
}

/// Service side of notarisation: authenticate, extract, commit, respond.
///
/// Checks uniqueness only. Contract validity is never verified, so an
/// invalid transaction whose facts are well formed is committed; the
/// requester's identity is recorded with every commit.
pub struct NonValidatingNotaryFlow<U, S> {
    session: FlowSession,
    notary: Party,
    config: NotaryConfig,
    uniqueness: Arc<U>,
    signer: Arc<S>,
    clock: Arc<dyn TimeSource>,
}

impl<U, S> NonValidatingNotaryFlow<U, S>
where
    U: UniquenessProvider + 'static,
    S: NotarySigner + 'static,
{
    pub fn new(
        session: FlowSession,
        notary: Party,
        config: NotaryConfig,
        uniqueness: Arc<U>,
        signer: Arc<S>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            session,
            notary,
            config,
            uniqueness,
            signer,
            clock,
        }
    }

    fn transition(&self, ctx: &FlowContext, state: NotaryFlowState) {
        debug!(run_id = %ctx.run_id(), state = ?state, "Notary flow transition");
        if let Err(e) = ctx.record_state(&state) {
            warn!(run_id = %ctx.run_id(), error = %e, "Failed to record notary flow state");
        }
    }

    /// Authenticate the payload's request, then reduce it to facts.
    fn verify_payload(
        &self,
        ctx: &FlowContext,
        requester: &Party,
        payload: NotarisationPayload,
    ) -> NotaryResult<TransactionParts> {
        let transaction = payload.transaction;
        let tx_id = transaction.id();

        self.transition(ctx, NotaryFlowState::Authenticate { tx_id });
        ctx.progress().set_current_step(AUTHENTICATING);
        let request = NotarisationRequest::for_transaction(&transaction)?;
        validate_request(&request, &payload.request_signature, requester)?;

        self.transition(ctx, NotaryFlowState::ExtractFacts { tx_id });
        ctx.progress().set_current_step(EXTRACTING);
        extract_parts(&transaction)
    }

    fn check_notary(&self, parts: &TransactionParts) -> NotaryResult<()> {
        match &parts.notary {
            Some(notary) if *notary == self.notary => Ok(()),
            other => Err(NotaryError::WrongNotary {
                expected: self.notary.name.clone(),
                found: other.as_ref().map(|p| p.name.clone()),
            }),
        }
    }

    fn check_time_window(&self, parts: &TransactionParts) -> NotaryResult<()> {
        let Some(window) = &parts.time_window else {
            return Ok(());
        };
        let now = self.clock.now();
        if within_time_window(window, now, self.config.time_window_tolerance_ms) {
            Ok(())
        } else {
            Err(NotaryError::TimeWindowInvalid {
                current_time: now,
                window: *window,
            })
        }
    }

    async fn check_uniqueness(
        &self,
        ctx: &FlowContext,
        requester: &Party,
        parts: TransactionParts,
    ) -> NotaryResult<Hash> {
        let tx_id = parts.id;
        self.check_notary(&parts)?;
        self.check_time_window(&parts)?;

        self.transition(ctx, NotaryFlowState::CheckUniqueness { parts: parts.clone() });
        ctx.progress().set_current_step(CHECKING_UNIQUENESS);

        self.uniqueness
            .commit(&tx_id, &parts.inputs, parts.time_window.as_ref(), requester)
            .await
            .map_err(|e| match e {
                UniquenessError::Conflict(conflicts) => {
                    metrics::record_conflicting_states(conflicts.len());
                    NotaryError::Conflict { tx_id, conflicts }
                }
                UniquenessError::Unavailable(reason) => NotaryError::PeerUnavailable { reason },
            })?;

        Ok(tx_id)
    }

    async fn respond_signed(
        &mut self,
        ctx: &FlowContext,
        tx_id: Hash,
    ) -> NotaryResult<TransactionSignature> {
        self.transition(ctx, NotaryFlowState::Respond { tx_id });
        ctx.progress().set_current_step(RESPONDING);

        let signature = match self.signer.sign(&tx_id).await {
            Ok(signature) => signature,
            Err(error) => return Err(self.reject(ctx, error).await),
        };
        let response = NotarisationResponse::Signed(signature.clone());
        if let Err(e) = ctx.send(&mut self.session, &response).await {
            let error = NotaryError::from(e);
            self.transition(ctx, NotaryFlowState::Rejected { error: error.clone() });
            metrics::record_rejected(error.kind());
            warn!(run_id = %ctx.run_id(), tx_id = %short_hex(&tx_id), error = %error, "Committed but could not deliver signature");
            return Err(error);
        }

        self.transition(ctx, NotaryFlowState::Committed { tx_id });
        metrics::record_committed();
        info!(
            run_id = %ctx.run_id(),
            tx_id = %short_hex(&tx_id),
            requester = %self.session.counterparty(),
            "Transaction notarised"
        );
        Ok(signature)
    }

    /// Record the rejection and report it to the requester.
    async fn reject(&mut self, ctx: &FlowContext, error: NotaryError) -> NotaryError {
        self.transition(ctx, NotaryFlowState::Rejected { error: error.clone() });
        metrics::record_rejected(error.kind());
        warn!(
            run_id = %ctx.run_id(),
            requester = %self.session.counterparty(),
            reason = error.kind(),
            error = %error,
            "Notarisation rejected"
        );

        ctx.progress().set_current_step(RESPONDING);
        let response = NotarisationResponse::Rejected(error.clone());
        if let Err(e) = ctx.send(&mut self.session, &response).await {
            warn!(run_id = %ctx.run_id(), error = %e, "Could not deliver rejection");
        }
        error
    }
}

#[async_trait]
impl<U, S> FlowLogic for NonValidatingNotaryFlow<U, S>
where
    U: UniquenessProvider + 'static,
    S: NotarySigner + 'static,
{
    type Output = TransactionSignature;
    type Error = NotaryError;

    fn flow_name(&self) -> &'static str {
        "NonValidatingNotaryFlow"
    }

    async fn call(mut self, ctx: FlowContext) -> Result<TransactionSignature, NotaryError> {
        let requester = self.session.counterparty().clone();

        self.transition(&ctx, NotaryFlowState::AwaitPayload);
        ctx.progress().set_current_step(RECEIVING);
        let received = match ctx
            .receive::<NotarisationPayload>(&mut self.session)
            .await
        {
            Ok(received) => received,
            Err(e) => {
                let error = NotaryError::from(e);
                self.transition(&ctx, NotaryFlowState::Rejected { error: error.clone() });
                warn!(run_id = %ctx.run_id(), requester = %requester, error = %error, "No payload received");
                return Err(error);
            }
        };
        metrics::record_request_received();

        let verified = received.validate(|payload| self.verify_payload(&ctx, &requester, payload));
        let parts = match verified {
            Ok(parts) => parts,
            Err(error) => return Err(self.reject(&ctx, error).await),
        };

        let tx_id = match self.check_uniqueness(&ctx, &requester, parts).await {
            Ok(tx_id) => tx_id,
            Err(error) => return Err(self.reject(&ctx, error).await),
        };

        self.respond_signed(&ctx, tx_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_tolerance() {
        let window = TimeWindow::between(1_000, 2_000).unwrap();
        assert!(within_time_window(&window, 1_500, 0));
        assert!(!within_time_window(&window, 999, 0));
        assert!(within_time_window(&window, 999, 1));
        assert!(!within_time_window(&window, 2_000, 0));
        assert!(within_time_window(&window, 2_000, 1));
        assert!(within_time_window(&TimeWindow::from_only(10), u64::MAX, 5));
        assert!(within_time_window(&TimeWindow::until_only(10), 0, u64::MAX));
    }

    #[test]
    fn test_terminal_states() {
        assert!(NotaryFlowState::Committed { tx_id: [0; 32] }.is_terminal());
        assert!(!NotaryFlowState::AwaitPayload.is_terminal());
    }
}
