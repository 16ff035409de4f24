//! Flow handles
//!
//! A handle is what the invoker of a flow holds: the run id, the eventual
//! result and, for tracked flows, the progress stream. It is the only owner of
//! the run's cancellation capability.
//!
//! ```text
//! start_flow ──→ [PENDING] ──flow returns──→ [READY] ──result()──→ value
//!                   │
//!                   └──close()──→ [CANCELLED] ──result()──→ FlowFailure::Cancelled
//! ```
//!
//! Closing a handle whose result already arrived keeps that result; closing a
//! pending handle drops the result channel, so the engine can never deliver a
//! stale value afterwards.

use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};

use super::progress::ProgressStream;
use super::run_id::StateMachineRunId;
use crate::error::FlowFailure;

/// What a handle resolves to.
pub type FlowOutcome<A, E> = Result<A, FlowFailure<E>>;

enum ReturnSlot<A, E> {
    Pending(oneshot::Receiver<FlowOutcome<A, E>>),
    Ready(FlowOutcome<A, E>),
    Cancelled,
}

/// Handle to a started flow returning `A` or failing with `E`.
pub struct FlowHandle<A, E> {
    id: StateMachineRunId,
    slot: ReturnSlot<A, E>,
    cancel: watch::Sender<bool>,
}

impl<A, E> FlowHandle<A, E> {
    pub(crate) fn new(
        id: StateMachineRunId,
        result: oneshot::Receiver<FlowOutcome<A, E>>,
        cancel: watch::Sender<bool>,
    ) -> Self {
        Self {
            id,
            slot: ReturnSlot::Pending(result),
            cancel,
        }
    }

    /// The started state machine's id.
    pub fn id(&self) -> StateMachineRunId {
        self.id
    }

    /// Whether `close()` cancelled this handle before it resolved.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.slot, ReturnSlot::Cancelled)
    }

    /// Non-blocking peek: has the flow resolved (or been cancelled)?
    pub fn is_done(&mut self) -> bool {
        self.poll_ready();
        !matches!(self.slot, ReturnSlot::Pending(_))
    }

    /// Cancel the eventual result.
    ///
    /// Best effort and non-blocking: the flow observes cancellation at its next
    /// suspension point. Never fails; closing twice is a no-op.
    pub fn close(&mut self) {
        // Flow may already be gone.
        let _ = self.cancel.send(true);

        self.poll_ready();
        if matches!(self.slot, ReturnSlot::Pending(_)) {
            self.slot = ReturnSlot::Cancelled;
        }
    }

    /// Wait for the flow's result.
    pub async fn result(self) -> FlowOutcome<A, E> {
        match self.slot {
            ReturnSlot::Pending(receiver) => receiver.await.unwrap_or(Err(FlowFailure::Aborted)),
            ReturnSlot::Ready(outcome) => outcome,
            ReturnSlot::Cancelled => Err(FlowFailure::Cancelled),
        }
    }

    /// Wait for the flow's result and package it with the run id, ready to
    /// cross a process boundary.
    pub async fn resolve(self) -> ResolvedFlow<A, E> {
        let id = self.id;
        ResolvedFlow {
            id,
            outcome: self.result().await,
        }
    }

    fn poll_ready(&mut self) {
        let ReturnSlot::Pending(receiver) = &mut self.slot else {
            return;
        };
        match receiver.try_recv() {
            Ok(outcome) => self.slot = ReturnSlot::Ready(outcome),
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.slot = ReturnSlot::Ready(Err(FlowFailure::Aborted))
            }
        }
    }
}

impl<A, E> std::fmt::Debug for FlowHandle<A, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.slot {
            ReturnSlot::Pending(_) => "pending",
            ReturnSlot::Ready(_) => "ready",
            ReturnSlot::Cancelled => "cancelled",
        };
        f.debug_struct("FlowHandle")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}

/// Handle to a tracked flow: a [`FlowHandle`] plus its progress stream.
#[derive(Debug)]
pub struct FlowProgressHandle<A, E> {
    handle: FlowHandle<A, E>,
    progress: ProgressStream,
}

impl<A, E> FlowProgressHandle<A, E> {
    pub(crate) fn new(handle: FlowHandle<A, E>, progress: ProgressStream) -> Self {
        Self { handle, progress }
    }

    pub fn id(&self) -> StateMachineRunId {
        self.handle.id()
    }

    /// The stream of progress steps.
    pub fn progress(&mut self) -> &mut ProgressStream {
        &mut self.progress
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Drain the progress stream, then cancel the result.
    pub fn close(&mut self) {
        self.progress.drain();
        self.handle.close();
    }

    pub async fn result(self) -> FlowOutcome<A, E> {
        self.handle.result().await
    }

    pub async fn resolve(self) -> ResolvedFlow<A, E> {
        self.handle.resolve().await
    }
}

/// A flow handle after resolution: the serialisable part of a handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFlow<A, E> {
    pub id: StateMachineRunId,
    pub outcome: FlowOutcome<A, E>,
}
