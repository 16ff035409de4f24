//! Progress reporting
//!
//! A tracked flow publishes human readable step names. The caller sees them
//! as a [`ProgressStream`]: finite (ends with the flow), single-consumer and
//! not restartable (steps consumed are gone).

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

use super::run_id::StateMachineRunId;

/// Flow-side publisher of progress steps.
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    run_id: StateMachineRunId,
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl ProgressTracker {
    /// Tracker paired with the stream the caller will read.
    pub(crate) fn channel(run_id: StateMachineRunId) -> (Self, ProgressStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                run_id,
                sender: Some(sender),
            },
            ProgressStream { receiver },
        )
    }

    /// Tracker for an untracked flow: steps are only logged.
    pub(crate) fn disabled(run_id: StateMachineRunId) -> Self {
        Self {
            run_id,
            sender: None,
        }
    }

    /// Publish the step the flow is entering.
    pub fn set_current_step(&self, step: impl Into<String>) {
        let step = step.into();
        debug!(run_id = %self.run_id, step = %step, "Flow progress");

        if let Some(sender) = &self.sender {
            // Caller may have closed the stream already.
            let _ = sender.send(step);
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.sender.is_some()
    }
}

/// Caller-side stream of progress steps.
#[derive(Debug)]
pub struct ProgressStream {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl ProgressStream {
    /// Wait for the next step, or `None` once the flow has finished.
    pub async fn next_step(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Unsubscribe and discard anything already buffered.
    ///
    /// Never fails; calling it twice is harmless.
    pub fn drain(&mut self) {
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Stream for ProgressStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
