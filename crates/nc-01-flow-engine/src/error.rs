//! Error types for the Flow Engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures reported by a [`SessionTransport`](crate::ports::outbound::SessionTransport).
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportError {
    /// The counterparty went away (channel closed).
    #[error("Peer disconnected: {peer}")]
    Disconnected { peer: String },

    /// Nothing arrived within the transport's receive timeout.
    #[error("Timed out after {after_ms}ms waiting for {peer}")]
    Timeout { peer: String, after_ms: u64 },

    /// The session is not connected to this peer.
    #[error("Session has no route to {peer}")]
    UnknownPeer { peer: String },
}

/// Failures at a flow suspension point.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Outbound message could not be encoded.
    #[error("Failed to serialize message: {0}")]
    Serialization(String),

    /// Inbound bytes were not the expected message type.
    #[error("Expected {expected} from peer: {reason}")]
    Deserialization {
        expected: &'static str,
        reason: String,
    },

    /// The flow's handle was closed while it was suspended.
    #[error("Flow cancelled at suspension point")]
    Cancelled,

    /// The checkpoint for this suspension could not be written.
    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Checkpoint storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("Checkpoint storage error: {0}")]
    Storage(String),

    #[error("Failed to encode checkpoint snapshot: {0}")]
    Snapshot(String),
}

/// Errors starting a flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowEngineError {
    /// `start_flow` was called outside a tokio runtime.
    #[error("No async runtime available to schedule flow")]
    NoRuntime,
}

/// How a flow's eventual result can fail, as seen through its handle.
///
/// `Cancelled` is reserved for `close()` and is never produced by flow logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowFailure<E> {
    /// The handle was closed before the flow resolved.
    Cancelled,
    /// The flow task panicked or was torn down before reporting.
    Aborted,
    /// The flow logic returned an error.
    Flow(E),
}

impl<E> FlowFailure<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The flow's own error, if that is what this failure is.
    pub fn flow_error(&self) -> Option<&E> {
        match self {
            Self::Flow(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for FlowFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "Flow was cancelled"),
            Self::Aborted => write!(f, "Flow aborted before completing"),
            Self::Flow(e) => write!(f, "{}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for FlowFailure<E> {}

/// Result type for engine operations
pub type FlowEngineResult<T> = Result<T, FlowEngineError>;
