//! In-Memory Checkpoint Storage
//!
//! Keeps the latest checkpoint per run. Used by tests and by nodes that do
//! not need flows to survive a restart.

use crate::domain::{Checkpoint, StateMachineRunId};
use crate::error::CheckpointError;
use crate::ports::outbound::CheckpointStorage;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct InMemoryCheckpointStorage {
    latest: RwLock<HashMap<StateMachineRunId, Checkpoint>>,
    written: AtomicU64,
}

impl InMemoryCheckpointStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest checkpoint of `run_id`, if the run is still in flight.
    pub fn latest(&self, run_id: StateMachineRunId) -> Option<Checkpoint> {
        self.latest.read().get(&run_id).cloned()
    }

    /// Total checkpoints written since creation.
    pub fn checkpoints_written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointStorage for InMemoryCheckpointStorage {
    async fn add_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        let mut latest = self.latest.write();
        if let Some(previous) = latest.get(&checkpoint.run_id) {
            if previous.sequence >= checkpoint.sequence {
                return Err(CheckpointError::Storage(format!(
                    "out of order checkpoint {} for run {} (have {})",
                    checkpoint.sequence, checkpoint.run_id, previous.sequence
                )));
            }
        }
        latest.insert(checkpoint.run_id, checkpoint);
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_checkpoints(&self, run_id: StateMachineRunId) -> Result<(), CheckpointError> {
        self.latest.write().remove(&run_id);
        Ok(())
    }

    async fn checkpoints(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        let mut all: Vec<Checkpoint> = self.latest.read().values().cloned().collect();
        all.sort_by_key(|c| c.run_id);
        Ok(all)
    }
}
