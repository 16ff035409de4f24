//! # Shared Crypto - Hashing and Signing Primitives
//!
//! Every digest and signature in Notary-Chain goes through this crate, so
//! there is a single audit surface for cryptographic correctness.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Transaction ids, Merkle nodes, attachment ids |
//! | `signatures` | Ed25519 | Request signatures, notary signatures |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, strict verification (rejects
//!   small-order keys and non-canonical S)
//! - **SHA-256**: Content addressing over the full byte stream

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Sha256Hasher};
pub use signatures::{verify_signature, Ed25519KeyPair, Ed25519PublicKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
