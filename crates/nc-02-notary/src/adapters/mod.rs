//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the notary's outbound ports.

mod signer;
mod time_source;
mod uniqueness;

pub use signer::Ed25519NotarySigner;
pub use time_source::FixedTimeSource;
pub use uniqueness::InMemoryUniquenessProvider;
