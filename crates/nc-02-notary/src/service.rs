//! Notary Service - binds notary collaborators to inbound sessions

use crate::flows::NonValidatingNotaryFlow;
use crate::ports::inbound::{NotarisationHandle, NotaryApi};
use crate::ports::outbound::{
    NotarySigner, SystemTimeSource, TimeSource, TransactionSignature, UniquenessProvider,
};
use crate::error::NotaryError;
use nc_01_flow_engine::{
    FlowEngine, FlowEngineResult, FlowProgressHandle, FlowSession, FlowStarter,
};
use shared_types::Party;
use std::sync::Arc;
use tracing::{debug, warn};

/// Notary configuration
#[derive(Clone, Debug)]
pub struct NotaryConfig {
    /// Clock skew allowed on both edges of a time window (milliseconds)
    pub time_window_tolerance_ms: u64,
    /// Platform version stamped on notary signatures
    pub platform_version: u32,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            time_window_tolerance_ms: 30_000,
            platform_version: 4,
        }
    }
}

impl NotaryConfig {
    /// Read overrides from the environment
    /// (`NC_NOTARY_TIME_TOLERANCE_MS`, `NC_PLATFORM_VERSION`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(tolerance) = std::env::var("NC_NOTARY_TIME_TOLERANCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.time_window_tolerance_ms = tolerance;
        }
        if let Some(version) = std::env::var("NC_PLATFORM_VERSION")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.platform_version = version;
        }
        config
    }
}

/// A notary node: one identity, one uniqueness store, one signing key.
///
/// Every accepted session runs its own [`NonValidatingNotaryFlow`]; all runs
/// share the uniqueness provider.
pub struct NotaryService<U, S> {
    identity: Party,
    config: NotaryConfig,
    uniqueness: Arc<U>,
    signer: Arc<S>,
    clock: Arc<dyn TimeSource>,
}

impl<U, S> NotaryService<U, S>
where
    U: UniquenessProvider + 'static,
    S: NotarySigner + 'static,
{
    pub fn new(identity: Party, config: NotaryConfig, uniqueness: Arc<U>, signer: Arc<S>) -> Self {
        Self::with_time_source(identity, config, uniqueness, signer, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        identity: Party,
        config: NotaryConfig,
        uniqueness: Arc<U>,
        signer: Arc<S>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        if signer.public_key() != identity.owning_key {
            warn!(
                notary = %identity,
                "[nc-02] Signing key differs from notary identity key; clients will refuse signatures"
            );
        }
        Self {
            identity,
            config,
            uniqueness,
            signer,
            clock,
        }
    }

    pub fn config(&self) -> &NotaryConfig {
        &self.config
    }

    pub fn uniqueness(&self) -> &Arc<U> {
        &self.uniqueness
    }

    fn flow_for(&self, session: FlowSession) -> NonValidatingNotaryFlow<U, S> {
        NonValidatingNotaryFlow::new(
            session,
            self.identity.clone(),
            self.config.clone(),
            Arc::clone(&self.uniqueness),
            Arc::clone(&self.signer),
            Arc::clone(&self.clock),
        )
    }
}

impl<U, S> NotaryApi for NotaryService<U, S>
where
    U: UniquenessProvider + 'static,
    S: NotarySigner + 'static,
{
    fn notary_identity(&self) -> &Party {
        &self.identity
    }

    fn accept_session(
        &self,
        engine: &FlowEngine,
        session: FlowSession,
    ) -> FlowEngineResult<NotarisationHandle> {
        let requester = session.counterparty().clone();
        let handle = engine.start_flow(self.flow_for(session))?;
        debug!(run_id = %handle.id(), requester = %requester, "[nc-02] Accepted notarisation session");
        Ok(handle)
    }

    fn accept_tracked_session(
        &self,
        engine: &FlowEngine,
        session: FlowSession,
    ) -> FlowEngineResult<FlowProgressHandle<TransactionSignature, NotaryError>> {
        let requester = session.counterparty().clone();
        let handle = engine.start_tracked_flow(self.flow_for(session))?;
        debug!(run_id = %handle.id(), requester = %requester, "[nc-02] Accepted tracked notarisation session");
        Ok(handle)
    }
}
