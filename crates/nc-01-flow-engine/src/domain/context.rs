//! Flow logic and its execution context
//!
//! ## Suspension Points
//!
//! A flow runs as one tokio task. It yields to the scheduler only inside
//! [`FlowContext::send`] and [`FlowContext::receive`]. At each of these the
//! context:
//!
//! 1. refuses to continue if the flow's handle was closed,
//! 2. writes a [`Checkpoint`] carrying the flow's last recorded state,
//! 3. awaits the transport, racing it against cancellation.
//!
//! Code between two suspension points runs to completion; cancellation cannot
//! interrupt it.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::Party;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::checkpoint::{Checkpoint, SuspensionPoint};
use super::progress::ProgressTracker;
use super::run_id::StateMachineRunId;
use super::session::{FlowSession, UntrustworthyData};
use crate::error::{CheckpointError, SessionError, TransportError};
use crate::ports::outbound::CheckpointStorage;

/// A multi-party protocol that runs inside the engine.
#[async_trait]
pub trait FlowLogic: Send + Sized + 'static {
    type Output: Send + 'static;
    type Error: Send + 'static;

    /// Name recorded in checkpoints and logs.
    fn flow_name(&self) -> &'static str;

    /// Run the flow to completion.
    async fn call(self, ctx: FlowContext) -> Result<Self::Output, Self::Error>;
}

pub(crate) struct CheckpointRecorder {
    storage: Arc<dyn CheckpointStorage>,
    sequence: AtomicU64,
    snapshot: Mutex<Vec<u8>>,
}

impl CheckpointRecorder {
    pub(crate) fn new(storage: Arc<dyn CheckpointStorage>) -> Self {
        Self {
            storage,
            sequence: AtomicU64::new(0),
            snapshot: Mutex::new(Vec::new()),
        }
    }
}

/// Everything a running flow can do besides computing.
pub struct FlowContext {
    run_id: StateMachineRunId,
    flow_name: &'static str,
    our_identity: Party,
    progress: ProgressTracker,
    cancelled: watch::Receiver<bool>,
    recorder: Option<CheckpointRecorder>,
}

impl FlowContext {
    pub(crate) fn new(
        run_id: StateMachineRunId,
        flow_name: &'static str,
        our_identity: Party,
        progress: ProgressTracker,
        cancelled: watch::Receiver<bool>,
        recorder: Option<CheckpointRecorder>,
    ) -> Self {
        Self {
            run_id,
            flow_name,
            our_identity,
            progress,
            cancelled,
            recorder,
        }
    }

    pub fn run_id(&self) -> StateMachineRunId {
        self.run_id
    }

    pub fn flow_name(&self) -> &'static str {
        self.flow_name
    }

    /// The identity of the node running this flow.
    pub fn our_identity(&self) -> &Party {
        &self.our_identity
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Whether the invoker closed this flow's handle.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Publish the flow's current state; it is written with the next
    /// checkpoint.
    pub fn record_state<S: Serialize>(&self, state: &S) -> Result<(), CheckpointError> {
        let Some(recorder) = &self.recorder else {
            return Ok(());
        };
        let encoded =
            bincode::serialize(state).map_err(|e| CheckpointError::Snapshot(e.to_string()))?;
        *recorder.snapshot.lock() = encoded;
        Ok(())
    }

    /// Send `message` to the session's counterparty. Suspension point.
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        session: &mut FlowSession,
        message: &T,
    ) -> Result<(), SessionError> {
        let payload =
            bincode::serialize(message).map_err(|e| SessionError::Serialization(e.to_string()))?;
        let peer = session.counterparty().clone();

        self.suspend(SuspensionPoint::Send {
            peer: peer.name.clone(),
        })
        .await?;

        self.race_cancellation(session.transport.send(&peer, payload))
            .await
    }

    /// Receive a `T` from the session's counterparty. Suspension point.
    pub async fn receive<T: DeserializeOwned>(
        &self,
        session: &mut FlowSession,
    ) -> Result<UntrustworthyData<T>, SessionError> {
        let expected = std::any::type_name::<T>();
        let peer = session.counterparty().clone();

        self.suspend(SuspensionPoint::Receive {
            peer: peer.name.clone(),
            expected: expected.to_string(),
        })
        .await?;

        let bytes = self
            .race_cancellation(session.transport.receive(&peer))
            .await?;
        let message = bincode::deserialize(&bytes).map_err(|e| SessionError::Deserialization {
            expected,
            reason: e.to_string(),
        })?;
        Ok(UntrustworthyData::new(message))
    }

    /// Send then wait for the reply.
    pub async fn send_and_receive<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        session: &mut FlowSession,
        message: &T,
    ) -> Result<UntrustworthyData<R>, SessionError> {
        self.send(session, message).await?;
        self.receive(session).await
    }

    async fn suspend(&self, point: SuspensionPoint) -> Result<(), SessionError> {
        if self.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        debug!(run_id = %self.run_id, flow = self.flow_name, suspension = ?point, "Flow suspending");

        let Some(recorder) = &self.recorder else {
            return Ok(());
        };
        let checkpoint = Checkpoint {
            run_id: self.run_id,
            flow_name: self.flow_name.to_string(),
            sequence: recorder.sequence.fetch_add(1, Ordering::SeqCst),
            suspension: point,
            snapshot: recorder.snapshot.lock().clone(),
        };
        recorder.storage.add_checkpoint(checkpoint).await?;
        Ok(())
    }

    async fn race_cancellation<T>(
        &self,
        operation: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, SessionError> {
        let cancelled = self.cancelled.clone();
        tokio::select! {
            biased;
            _ = wait_for_cancel(cancelled) => Err(SessionError::Cancelled),
            result = operation => result.map_err(SessionError::from),
        }
    }
}

/// Resolves once the handle is closed. A dropped handle never cancels.
async fn wait_for_cancel(mut cancelled: watch::Receiver<bool>) {
    let handle_dropped = cancelled.wait_for(|c| *c).await.is_err();
    if handle_dropped {
        std::future::pending::<()>().await;
    }
}
