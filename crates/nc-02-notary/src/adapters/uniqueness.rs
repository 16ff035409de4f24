//! In-Memory Uniqueness Provider
//!
//! Single-node uniqueness store. One mutex guards the whole consumed-state
//! map so each commit is one atomic check-and-insert.

use crate::error::{StateConflict, UniquenessError};
use crate::ports::outbound::{ConsumingTx, UniquenessProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_crypto::sha256;
use shared_types::{short_hex, Hash, Party, StateRef, TimeWindow};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct CommitRecord {
    caller: Party,
    time_window: Option<TimeWindow>,
}

#[derive(Default)]
struct UniquenessState {
    consumed: HashMap<StateRef, ConsumingTx>,
    committed: HashMap<Hash, CommitRecord>,
}

#[derive(Default)]
pub struct InMemoryUniquenessProvider {
    state: Mutex<UniquenessState>,
    commit_calls: AtomicU64,
}

impl InMemoryUniquenessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `commit` invocations, successful or not.
    pub fn commit_calls(&self) -> u64 {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub fn consumed_count(&self) -> usize {
        self.state.lock().consumed.len()
    }

    pub fn is_consumed(&self, state: &StateRef) -> bool {
        self.state.lock().consumed.contains_key(state)
    }

    /// Requester recorded for a committed transaction.
    pub fn committed_by(&self, tx_id: &Hash) -> Option<Party> {
        self.state
            .lock()
            .committed
            .get(tx_id)
            .map(|record| record.caller.clone())
    }

    /// Time window recorded for a committed transaction.
    pub fn committed_time_window(&self, tx_id: &Hash) -> Option<TimeWindow> {
        self.state
            .lock()
            .committed
            .get(tx_id)
            .and_then(|record| record.time_window)
    }
}

#[async_trait]
impl UniquenessProvider for InMemoryUniquenessProvider {
    async fn commit(
        &self,
        tx_id: &Hash,
        inputs: &[StateRef],
        time_window: Option<&TimeWindow>,
        caller: &Party,
    ) -> Result<(), UniquenessError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();

        if state.committed.contains_key(tx_id) {
            debug!(tx_id = %short_hex(tx_id), "Transaction already committed");
            return Ok(());
        }

        let conflicts: Vec<StateConflict> = inputs
            .iter()
            .filter_map(|input| {
                state
                    .consumed
                    .get(input)
                    .map(|consumer| StateConflict {
                        state_ref: *input,
                        consuming_tx_hash: sha256(&consumer.tx_id),
                    })
            })
            .collect();
        if !conflicts.is_empty() {
            return Err(UniquenessError::Conflict(conflicts));
        }

        for (index, input) in inputs.iter().enumerate() {
            state.consumed.insert(
                *input,
                ConsumingTx {
                    tx_id: *tx_id,
                    input_index: index as u32,
                    requesting_party: caller.clone(),
                },
            );
        }
        state.committed.insert(
            *tx_id,
            CommitRecord {
                caller: caller.clone(),
                time_window: time_window.copied(),
            },
        );

        info!(
            tx_id = %short_hex(tx_id),
            inputs = inputs.len(),
            caller = %caller,
            "Inputs committed"
        );
        Ok(())
    }

    async fn consumption_of(&self, state: &StateRef) -> Option<ConsumingTx> {
        self.state.lock().consumed.get(state).cloned()
    }
}
