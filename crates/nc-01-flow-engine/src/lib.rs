//! # nc-01-flow-engine
//!
//! Runs suspendable multi-party flows and hands the invoker a cancelable
//! handle to each run.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Flow Handles**: run id plus an eventual result, cancelable via `close()`
//! - **Progress Handles**: handles that also stream human readable progress steps
//! - **Sessions**: typed send/receive with a counterparty over a pluggable transport
//! - **Checkpoints**: a record of every suspension point and the flow's last state
//!
//! ## Architecture
//!
//! ```text
//! Invoker ──start_flow(logic)──→ FlowEngine ──spawn──→ [flow task]
//!    ↑                               │                    │
//!    │                               │          ctx.send / ctx.receive
//!    │                               │                    │
//!    │                               │          CheckpointStorage + SessionTransport
//!    │                               └──supervisor task───┘
//!    └────────── FlowHandle ◄──── result / Aborted ───────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use nc_01_flow_engine::{FlowEngine, FlowEngineConfig, FlowStarter, InMemoryCheckpointStorage};
//!
//! let engine = FlowEngine::new(
//!     FlowEngineConfig::default(),
//!     our_identity,
//!     Arc::new(InMemoryCheckpointStorage::new()),
//! );
//!
//! let mut handle = engine.start_tracked_flow(my_flow)?;
//! while let Some(step) = handle.progress().next_step().await {
//!     println!("{step}");
//! }
//! let value = handle.result().await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryCheckpointStorage, InMemoryNetwork};
pub use domain::{
    Checkpoint, FlowContext, FlowHandle, FlowLogic, FlowOutcome, FlowProgressHandle, FlowSession,
    ProgressStream, ProgressTracker, ResolvedFlow, StateMachineRunId, SuspensionPoint,
    UntrustworthyData,
};
pub use error::{
    CheckpointError, FlowEngineError, FlowEngineResult, FlowFailure, SessionError, TransportError,
};
pub use ports::{CheckpointStorage, FlowStarter, SessionTransport};
pub use service::{FlowEngine, FlowEngineConfig};

/// Re-exported for implementors of [`FlowLogic`] and the outbound ports.
pub use async_trait::async_trait;
