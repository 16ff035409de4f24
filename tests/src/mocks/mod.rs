//! Test doubles for shared ports.

pub mod attachment_storage;

pub use attachment_storage::MockAttachmentStorage;
