//! Flow Engine Service - schedules flows as tokio tasks

use crate::domain::context::CheckpointRecorder;
use crate::domain::handle::FlowOutcome;
use crate::domain::{
    FlowContext, FlowHandle, FlowLogic, FlowProgressHandle, ProgressTracker, StateMachineRunId,
};
use crate::error::{CheckpointError, FlowEngineError, FlowEngineResult, FlowFailure};
use crate::ports::inbound::FlowStarter;
use crate::ports::outbound::CheckpointStorage;
use parking_lot::RwLock;
use shared_types::Party;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

/// Flow engine configuration
#[derive(Clone, Debug)]
pub struct FlowEngineConfig {
    /// Write a checkpoint at every suspension point
    pub checkpoint_on_suspend: bool,
}

impl Default for FlowEngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_on_suspend: true,
        }
    }
}

impl FlowEngineConfig {
    /// Read overrides from the environment (`NC_FLOW_CHECKPOINTS`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("NC_FLOW_CHECKPOINTS") {
            config.checkpoint_on_suspend = !matches!(value.as_str(), "0" | "false" | "off");
        }
        config
    }
}

/// Internal bookkeeping for running flows
#[derive(Default)]
struct EngineState {
    live: HashSet<StateMachineRunId>,
    started: u64,
}

/// Runs flows and hands out their handles.
pub struct FlowEngine {
    config: FlowEngineConfig,
    our_identity: Party,
    checkpoints: Arc<dyn CheckpointStorage>,
    state: Arc<RwLock<EngineState>>,
}

impl FlowEngine {
    pub fn new(
        config: FlowEngineConfig,
        our_identity: Party,
        checkpoints: Arc<dyn CheckpointStorage>,
    ) -> Self {
        Self {
            config,
            our_identity,
            checkpoints,
            state: Arc::new(RwLock::new(EngineState::default())),
        }
    }

    /// The node identity flows started here run as.
    pub fn our_identity(&self) -> &Party {
        &self.our_identity
    }

    /// Total flows started since creation.
    pub fn flows_started(&self) -> u64 {
        self.state.read().started
    }

    /// Number of runs that currently have a checkpoint stored.
    pub async fn checkpoint_count(&self) -> Result<usize, CheckpointError> {
        Ok(self.checkpoints.checkpoints().await?.len())
    }

    fn current_runtime() -> FlowEngineResult<Handle> {
        Handle::try_current().map_err(|_| FlowEngineError::NoRuntime)
    }

    /// Allocate a run id that is not live and mark it live.
    fn allocate_run_id(&self) -> StateMachineRunId {
        let mut state = self.state.write();
        loop {
            let candidate = StateMachineRunId::create_random();
            if state.live.insert(candidate) {
                state.started += 1;
                return candidate;
            }
        }
    }

    fn launch<F: FlowLogic>(
        &self,
        runtime: Handle,
        run_id: StateMachineRunId,
        logic: F,
        progress: ProgressTracker,
    ) -> FlowHandle<F::Output, F::Error> {
        let flow_name = logic.flow_name();
        let (result_tx, result_rx) = oneshot::channel::<FlowOutcome<F::Output, F::Error>>();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let recorder = self
            .config
            .checkpoint_on_suspend
            .then(|| CheckpointRecorder::new(Arc::clone(&self.checkpoints)));
        let ctx = FlowContext::new(
            run_id,
            flow_name,
            self.our_identity.clone(),
            progress,
            cancel_rx,
            recorder,
        );

        info!(run_id = %run_id, flow = flow_name, "[nc-01] Starting flow");

        let flow = runtime.spawn(logic.call(ctx));
        let state = Arc::clone(&self.state);
        let checkpoints = Arc::clone(&self.checkpoints);

        runtime.spawn(async move {
            let outcome = match flow.await {
                Ok(Ok(value)) => {
                    debug!(run_id = %run_id, flow = flow_name, "[nc-01] Flow completed");
                    Ok(value)
                }
                Ok(Err(error)) => {
                    debug!(run_id = %run_id, flow = flow_name, "[nc-01] Flow failed");
                    Err(FlowFailure::Flow(error))
                }
                Err(join_error) => {
                    warn!(
                        run_id = %run_id,
                        flow = flow_name,
                        error = %join_error,
                        "[nc-01] Flow aborted"
                    );
                    Err(FlowFailure::Aborted)
                }
            };

            if let Err(e) = checkpoints.remove_checkpoints(run_id).await {
                warn!(run_id = %run_id, error = %e, "[nc-01] Failed to remove checkpoints");
            }
            state.write().live.remove(&run_id);

            // Refused once the handle was closed.
            if result_tx.send(outcome).is_err() {
                debug!(run_id = %run_id, "[nc-01] Result discarded, handle closed");
            }
        });

        FlowHandle::new(run_id, result_rx, cancel_tx)
    }
}

impl FlowStarter for FlowEngine {
    fn start_flow<F: FlowLogic>(
        &self,
        logic: F,
    ) -> FlowEngineResult<FlowHandle<F::Output, F::Error>> {
        let runtime = Self::current_runtime()?;
        let run_id = self.allocate_run_id();
        let progress = ProgressTracker::disabled(run_id);
        Ok(self.launch(runtime, run_id, logic, progress))
    }

    fn start_tracked_flow<F: FlowLogic>(
        &self,
        logic: F,
    ) -> FlowEngineResult<FlowProgressHandle<F::Output, F::Error>> {
        let runtime = Self::current_runtime()?;
        let run_id = self.allocate_run_id();
        let (progress, stream) = ProgressTracker::channel(run_id);
        let handle = self.launch(runtime, run_id, logic, progress);
        Ok(FlowProgressHandle::new(handle, stream))
    }

    fn live_flows(&self) -> Vec<StateMachineRunId> {
        let mut live: Vec<_> = self.state.read().live.iter().copied().collect();
        live.sort();
        live
    }
}
