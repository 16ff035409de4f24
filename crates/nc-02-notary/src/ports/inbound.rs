//! Driving Ports (API - Inbound)

use nc_01_flow_engine::{FlowEngine, FlowEngineResult, FlowHandle, FlowProgressHandle, FlowSession};
use shared_types::Party;

use super::outbound::TransactionSignature;
use crate::error::NotaryError;

/// Handle to one notarisation run on the notary side.
pub type NotarisationHandle = FlowHandle<TransactionSignature, NotaryError>;

/// Primary Notary API
pub trait NotaryApi: Send + Sync {
    /// The identity requesters address.
    fn notary_identity(&self) -> &Party;

    /// Serve one inbound session with a notarisation flow.
    fn accept_session(
        &self,
        engine: &FlowEngine,
        session: FlowSession,
    ) -> FlowEngineResult<NotarisationHandle>;

    /// As [`accept_session`](Self::accept_session), with progress steps.
    fn accept_tracked_session(
        &self,
        engine: &FlowEngine,
        session: FlowSession,
    ) -> FlowEngineResult<FlowProgressHandle<TransactionSignature, NotaryError>>;
}
