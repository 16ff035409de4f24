//! # Attachment Storage Port
//!
//! Content-addressed blob storage. The notary never reads attachments; the
//! port lives here so node wiring and test doubles share one contract.
//!
//! An [`AttachmentId`] is the SHA-256 of the *entire* byte stream, not of any
//! entry inside a container format.

use crate::entities::Hash;
use crate::errors::AttachmentError;
use std::io::Read;

/// Content hash identifying an attachment.
pub type AttachmentId = Hash;

/// Uploader recorded when the caller does not name one.
pub const UNKNOWN_UPLOADER: &str = "unknown";

/// A stored attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub data: Vec<u8>,
    pub uploader: String,
    pub filename: Option<String>,
    /// Contract classes declared by the attachment; empty for plain blobs.
    pub contract_class_names: Vec<String>,
}

impl Attachment {
    /// Whether this attachment carries contract code.
    pub fn is_contract_attachment(&self) -> bool {
        !self.contract_class_names.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Criteria for [`AttachmentStorage::query_attachments`].
#[derive(Debug, Clone, Default)]
pub struct AttachmentQuery {
    pub uploader: Option<String>,
    pub filename: Option<String>,
}

/// Content-addressed attachment storage.
pub trait AttachmentStorage: Send + Sync {
    /// Store the full contents of `stream`, returning its content hash.
    ///
    /// Implementations that refuse duplicates return
    /// [`AttachmentError::AlreadyExists`] carrying the existing id.
    fn import_attachment(
        &self,
        stream: &mut dyn Read,
        uploader: &str,
        filename: Option<&str>,
    ) -> Result<AttachmentId, AttachmentError>;

    /// Store `stream`, or return the id of the identical attachment already
    /// stored.
    fn import_or_get_attachment(&self, stream: &mut dyn Read) -> Result<AttachmentId, AttachmentError> {
        match self.import_attachment(stream, UNKNOWN_UPLOADER, None) {
            Err(AttachmentError::AlreadyExists(id)) => Ok(id),
            other => other,
        }
    }

    /// Load an attachment by content hash.
    fn open_attachment(&self, id: &AttachmentId) -> Option<Attachment>;

    fn has_attachment(&self, id: &AttachmentId) -> bool {
        self.open_attachment(id).is_some()
    }

    /// Find attachment ids matching `criteria`.
    fn query_attachments(&self, criteria: &AttachmentQuery) -> Result<Vec<AttachmentId>, AttachmentError>;
}

/// Drain a stream into memory.
pub fn read_all(stream: &mut dyn Read) -> Result<Vec<u8>, AttachmentError> {
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|e| AttachmentError::Io(e.to_string()))?;
    Ok(bytes)
}
