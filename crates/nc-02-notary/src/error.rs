//! Error types for the Notary subsystem

use nc_01_flow_engine::SessionError;
use serde::{Deserialize, Serialize};
use shared_types::{short_hex, Hash, StateRef, TimeWindow};
use thiserror::Error;

use crate::domain::transactions::ComponentGroupKind;

/// One input that another transaction already consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConflict {
    pub state_ref: StateRef,
    /// SHA-256 of the consuming transaction's id.
    pub consuming_tx_hash: Hash,
}

/// Why a notarisation was refused.
///
/// Every variant is terminal for the flow run and is sent back to the
/// requester over the session.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotaryError {
    /// Request signature or request contents do not match the transaction.
    #[error("Request authentication failed: {reason}")]
    AuthenticationFailure { reason: String },

    /// Only filtered and notary-change transactions are accepted.
    #[error("Unsupported transaction type: {found}")]
    UnsupportedTransactionType { found: String },

    /// A revealed component is not committed to by the transaction id.
    #[error("Merkle verification failed: {reason}")]
    MerkleVerificationFailure { reason: String },

    /// A group the notary must see was not fully revealed.
    #[error("Component group {group} is not fully visible")]
    HiddenComponentFailure { group: ComponentGroupKind },

    /// Inputs already consumed by other transactions.
    #[error("Input state conflict for transaction {}: {} state(s) already consumed", short_hex(.tx_id), .conflicts.len())]
    Conflict {
        tx_id: Hash,
        conflicts: Vec<StateConflict>,
    },

    /// The counterparty or a collaborator could not be reached.
    #[error("Peer unavailable: {reason}")]
    PeerUnavailable { reason: String },

    /// The transaction names a different notary, or hides its notary.
    #[error("Transaction is assigned to notary {found:?}, not {expected}")]
    WrongNotary {
        expected: String,
        found: Option<String>,
    },

    /// The notary's clock lies outside the transaction's time window.
    #[error("Notary time {current_time} is outside time window {window}")]
    TimeWindowInvalid {
        current_time: u64,
        window: TimeWindow,
    },

    /// A component could not be decoded.
    #[error("Transaction invalid: {reason}")]
    TransactionInvalid { reason: String },
}

impl NotaryError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailure { .. } => "authentication",
            Self::UnsupportedTransactionType { .. } => "unsupported_type",
            Self::MerkleVerificationFailure { .. } => "merkle",
            Self::HiddenComponentFailure { .. } => "hidden_component",
            Self::Conflict { .. } => "conflict",
            Self::PeerUnavailable { .. } => "peer_unavailable",
            Self::WrongNotary { .. } => "wrong_notary",
            Self::TimeWindowInvalid { .. } => "time_window",
            Self::TransactionInvalid { .. } => "transaction_invalid",
        }
    }
}

impl From<SessionError> for NotaryError {
    fn from(error: SessionError) -> Self {
        Self::PeerUnavailable {
            reason: error.to_string(),
        }
    }
}

/// Uniqueness provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UniquenessError {
    #[error("{} input state(s) already consumed", .0.len())]
    Conflict(Vec<StateConflict>),

    #[error("Uniqueness store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for notary operations
pub type NotaryResult<T> = Result<T, NotaryError>;
