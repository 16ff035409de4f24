//! Ports module for the Flow Engine

pub mod inbound;
pub mod outbound;

pub use inbound::FlowStarter;
pub use outbound::{CheckpointStorage, SessionTransport};
