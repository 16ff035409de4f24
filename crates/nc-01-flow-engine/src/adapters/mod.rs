//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports, used by node wiring in
//! tests and single-process deployments.

mod checkpoint_store;
mod in_memory_network;

pub use checkpoint_store::InMemoryCheckpointStorage;
pub use in_memory_network::InMemoryNetwork;
