//! # SHA-256 Hashing
//!
//! Content hashing for transaction ids, Merkle nodes and attachment ids.

use sha2::{Digest, Sha256};

/// SHA-256 hash output (256-bit).
pub type Hash = [u8; 32];

/// Stateful SHA-256 hasher.
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        self.inner.finalize().into()
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash the concatenation of multiple inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}
