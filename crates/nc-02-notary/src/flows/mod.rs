//! # Notarisation Flows
//!
//! The two sides of one notarisation exchange:
//!
//! ```text
//! NotaryClientFlow                         NonValidatingNotaryFlow
//!       │ ──── NotarisationPayload ────────────→ │
//!       │                                        │ authenticate, extract, commit
//!       │ ←─── NotarisationResponse ──────────── │
//! ```

pub mod client;
pub mod service;

use serde::{Deserialize, Serialize};

use crate::error::NotaryError;
use crate::ports::outbound::TransactionSignature;

pub use client::NotaryClientFlow;
pub use service::{within_time_window, NonValidatingNotaryFlow, NotaryFlowState};

/// The notary's answer to a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotarisationResponse {
    Signed(TransactionSignature),
    Rejected(NotaryError),
}
