//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{Checkpoint, StateMachineRunId};
use crate::error::{CheckpointError, TransportError};
use async_trait::async_trait;
use shared_types::Party;

/// Point-to-point message channel for one flow session.
///
/// Messages are opaque bytes; the flow context handles encoding.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Hand `payload` to the transport for delivery to `peer`.
    async fn send(&mut self, peer: &Party, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Wait for the next message from `peer`.
    async fn receive(&mut self, peer: &Party) -> Result<Vec<u8>, TransportError>;
}

/// Durable record of suspended flows.
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Record a checkpoint. Replaces any earlier checkpoint of the same run.
    async fn add_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError>;

    /// Forget a run. Called once the run has finished, however it finished.
    async fn remove_checkpoints(&self, run_id: StateMachineRunId) -> Result<(), CheckpointError>;

    /// Latest checkpoint of every run still in flight.
    async fn checkpoints(&self) -> Result<Vec<Checkpoint>, CheckpointError>;
}
