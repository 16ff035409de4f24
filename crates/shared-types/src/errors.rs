//! # Error Types
//!
//! Errors raised by the shared storage ports.

use crate::entities::Hash;
use thiserror::Error;

/// Errors raised by an [`AttachmentStorage`](crate::AttachmentStorage).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachmentError {
    /// An attachment with the same content hash is already stored.
    #[error("Attachment already exists: {}", hex::encode(.0))]
    AlreadyExists(Hash),

    /// The byte stream could not be read.
    #[error("Failed to read attachment stream: {0}")]
    Io(String),

    /// The storage does not implement this operation.
    #[error("Unsupported attachment operation: {0}")]
    Unsupported(&'static str),
}
