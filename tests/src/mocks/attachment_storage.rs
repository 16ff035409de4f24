//! # Mock Attachment Storage
//!
//! In-memory [`AttachmentStorage`] keyed by the SHA-256 of each attachment's
//! full byte stream. Importing identical bytes twice is refused with
//! [`AttachmentError::AlreadyExists`]; queries are not supported.

use parking_lot::RwLock;
use shared_crypto::sha256;
use shared_types::{
    read_all, Attachment, AttachmentError, AttachmentId, AttachmentQuery, AttachmentStorage,
};
use std::collections::HashMap;
use std::io::Read;

#[derive(Default)]
pub struct MockAttachmentStorage {
    files: RwLock<HashMap<AttachmentId, Attachment>>,
}

impl MockAttachmentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `stream` fully and return its content id with the bytes.
    pub fn attachment_id_and_bytes(
        stream: &mut dyn Read,
    ) -> Result<(AttachmentId, Vec<u8>), AttachmentError> {
        let bytes = read_all(stream)?;
        Ok((sha256(&bytes), bytes))
    }

    /// Store an attachment that declares `contract_class_names`.
    pub fn import_contract_attachment(
        &self,
        contract_class_names: Vec<String>,
        uploader: &str,
        stream: &mut dyn Read,
    ) -> Result<AttachmentId, AttachmentError> {
        self.store(stream, uploader, None, contract_class_names)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn store(
        &self,
        stream: &mut dyn Read,
        uploader: &str,
        filename: Option<&str>,
        contract_class_names: Vec<String>,
    ) -> Result<AttachmentId, AttachmentError> {
        let (id, data) = Self::attachment_id_and_bytes(stream)?;

        let mut files = self.files.write();
        if files.contains_key(&id) {
            return Err(AttachmentError::AlreadyExists(id));
        }
        files.insert(
            id,
            Attachment {
                id,
                data,
                uploader: uploader.to_string(),
                filename: filename.map(str::to_string),
                contract_class_names,
            },
        );
        Ok(id)
    }
}

impl AttachmentStorage for MockAttachmentStorage {
    fn import_attachment(
        &self,
        stream: &mut dyn Read,
        uploader: &str,
        filename: Option<&str>,
    ) -> Result<AttachmentId, AttachmentError> {
        self.store(stream, uploader, filename, Vec::new())
    }

    fn open_attachment(&self, id: &AttachmentId) -> Option<Attachment> {
        self.files.read().get(id).cloned()
    }

    fn query_attachments(
        &self,
        _criteria: &AttachmentQuery,
    ) -> Result<Vec<AttachmentId>, AttachmentError> {
        Err(AttachmentError::Unsupported("query_attachments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_id_is_hash_of_whole_stream() {
        let storage = MockAttachmentStorage::new();
        let bytes = b"PK\x03\x04 jar contents".to_vec();

        let id = storage
            .import_attachment(&mut Cursor::new(bytes.clone()), "O=Alice", Some("cash.jar"))
            .unwrap();

        assert_eq!(id, sha256(&bytes));
        let stored = storage.open_attachment(&id).unwrap();
        assert_eq!(stored.data, bytes);
        assert_eq!(stored.uploader, "O=Alice");
        assert_eq!(stored.filename.as_deref(), Some("cash.jar"));
        assert!(!stored.is_contract_attachment());
    }

    #[test]
    fn test_duplicate_import_is_refused_but_import_or_get_returns_id() {
        let storage = MockAttachmentStorage::new();
        let id = storage
            .import_attachment(&mut Cursor::new(vec![1, 2, 3]), "O=Alice", None)
            .unwrap();

        assert_eq!(
            storage.import_attachment(&mut Cursor::new(vec![1, 2, 3]), "O=Bob", None),
            Err(AttachmentError::AlreadyExists(id))
        );
        assert_eq!(
            storage.import_or_get_attachment(&mut Cursor::new(vec![1, 2, 3])),
            Ok(id)
        );
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.open_attachment(&id).unwrap().uploader, "O=Alice");
    }

    #[test]
    fn test_contract_attachment_records_class_names() {
        let storage = MockAttachmentStorage::new();
        let id = storage
            .import_contract_attachment(
                vec!["com.example.Cash".into()],
                "O=Bank",
                &mut Cursor::new(b"contract code".to_vec()),
            )
            .unwrap();

        let stored = storage.open_attachment(&id).unwrap();
        assert!(stored.is_contract_attachment());
        assert_eq!(stored.contract_class_names, vec!["com.example.Cash".to_string()]);
        assert!(storage.has_attachment(&id));
        assert!(!storage.has_attachment(&[0; 32]));
    }

    #[test]
    fn test_query_is_unsupported() {
        let storage = MockAttachmentStorage::new();
        assert!(storage.is_empty());
        assert!(matches!(
            storage.query_attachments(&AttachmentQuery::default()),
            Err(AttachmentError::Unsupported(_))
        ));
    }
}
