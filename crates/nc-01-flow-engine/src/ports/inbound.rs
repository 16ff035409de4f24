//! Driving Ports (API - Inbound)

use crate::domain::{FlowHandle, FlowLogic, FlowProgressHandle, StateMachineRunId};
use crate::error::FlowEngineResult;

/// Start flows and get handles back.
pub trait FlowStarter: Send + Sync {
    /// Start `logic`; the handle carries no progress.
    fn start_flow<F: FlowLogic>(
        &self,
        logic: F,
    ) -> FlowEngineResult<FlowHandle<F::Output, F::Error>>;

    /// Start `logic` with a progress stream attached.
    fn start_tracked_flow<F: FlowLogic>(
        &self,
        logic: F,
    ) -> FlowEngineResult<FlowProgressHandle<F::Output, F::Error>>;

    /// Runs started and not yet finished.
    fn live_flows(&self) -> Vec<StateMachineRunId>;
}
