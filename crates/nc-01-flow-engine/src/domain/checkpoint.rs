//! Checkpoints written at suspension points
//!
//! A flow suspends only when it sends to or receives from a peer. Before each
//! suspension the engine records where the flow is and the last state snapshot
//! the flow published, so a restarted node knows which runs were in flight and
//! what state machine position they had reached.

use serde::{Deserialize, Serialize};

use super::run_id::StateMachineRunId;

/// Where a flow is suspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspensionPoint {
    /// Waiting for a message from `peer`.
    Receive { peer: String, expected: String },
    /// Handing a message to the transport for `peer`.
    Send { peer: String },
}

/// Persisted record of a suspended flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub run_id: StateMachineRunId,
    pub flow_name: String,
    /// Increments at every suspension of this run.
    pub sequence: u64,
    pub suspension: SuspensionPoint,
    /// Bincode-encoded state published via `FlowContext::record_state`.
    pub snapshot: Vec<u8>,
}

impl Checkpoint {
    /// Decode the snapshot as the flow's state type.
    pub fn decode_snapshot<S: serde::de::DeserializeOwned>(&self) -> Option<S> {
        if self.snapshot.is_empty() {
            return None;
        }
        bincode::deserialize(&self.snapshot).ok()
    }
}
