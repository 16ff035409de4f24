//! Domain module for the Flow Engine
//!
//! ## Core Modules
//! - run_id: State machine run identifiers
//! - handle: Cancelable handles to running flows
//! - progress: Progress tracker and stream
//! - session: Peer sessions and untrusted received data
//! - context: Flow logic and suspension points
//! - checkpoint: Records written at suspension points

pub mod checkpoint;
pub mod context;
pub mod handle;
pub mod progress;
pub mod run_id;
pub mod session;

pub use checkpoint::{Checkpoint, SuspensionPoint};
pub use context::{FlowContext, FlowLogic};
pub use handle::{FlowHandle, FlowOutcome, FlowProgressHandle, ResolvedFlow};
pub use progress::{ProgressStream, ProgressTracker};
pub use run_id::StateMachineRunId;
pub use session::{FlowSession, UntrustworthyData};
