//! # Shared Types Crate
//!
//! Ledger primitives used by every Notary-Chain crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identities, state references and time windows
//!   are defined once here and reused by the flow engine and the notary.
//! - **Wire Friendly**: every type is `serde`-serialisable so it can travel
//!   inside a session message.
//! - **Ports, not Engines**: storage collaborators that live outside the notary
//!   core (attachments) are described as traits only.

pub mod attachments;
pub mod entities;
pub mod errors;

pub use attachments::{
    read_all, Attachment, AttachmentId, AttachmentQuery, AttachmentStorage, UNKNOWN_UPLOADER,
};
pub use entities::*;
pub use errors::*;
