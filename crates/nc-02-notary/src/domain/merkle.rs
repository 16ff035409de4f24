//! # Merkle Commitments
//!
//! Binary SHA-256 hash tree used for transaction ids and component group
//! roots.
//!
//! ## Invariants
//!
//! - Leaves are padded to the next power of two (minimum two) with
//!   [`ZERO_HASH`]; the empty tree's root is `ZERO_HASH`.
//! - Each parent is `H(left || right)`.
//! - Same leaves always produce the same root.
//! - No proof is longer than [`MAX_PROOF_DEPTH`]: component indices are
//!   committed as `u32`.

use serde::{Deserialize, Serialize};
use shared_crypto::Sha256Hasher;
use shared_types::{Hash, ZERO_HASH};
use thiserror::Error;

/// Longest proof path any tree built here can produce.
pub const MAX_PROOF_DEPTH: usize = u32::BITS as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("Leaf index {index} out of range (tree has {leaf_count} leaves)")]
    InvalidIndex { index: usize, leaf_count: usize },
}

/// A binary Merkle tree stored in array form: `[root, level1..., leaves...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    nodes: Vec<Hash>,
    leaf_count: usize,
    padded_leaf_count: usize,
    root: Hash,
}

impl MerkleTree {
    pub fn build(leaves: Vec<Hash>) -> Self {
        let leaf_count = leaves.len();

        if leaf_count == 0 {
            return Self {
                nodes: vec![ZERO_HASH],
                leaf_count: 0,
                padded_leaf_count: 0,
                root: ZERO_HASH,
            };
        }

        let padded_leaf_count = leaf_count.next_power_of_two().max(2);
        let mut padded = leaves;
        padded.resize(padded_leaf_count, ZERO_HASH);

        let leaf_start = padded_leaf_count - 1;
        let mut nodes = vec![ZERO_HASH; 2 * padded_leaf_count - 1];
        nodes[leaf_start..].copy_from_slice(&padded);

        // Parent at index i has children at 2i+1 and 2i+2
        for i in (0..leaf_start).rev() {
            nodes[i] = hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }

        let root = nodes[0];
        Self {
            nodes,
            leaf_count,
            padded_leaf_count,
            root,
        }
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    /// Number of real leaves (before padding).
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Proof length every leaf of this tree has.
    pub fn depth(&self) -> usize {
        self.padded_leaf_count.trailing_zeros() as usize
    }

    /// Sibling path from leaf `index` up to the root.
    pub fn generate_proof(&self, index: usize) -> Result<Vec<ProofNode>, MerkleError> {
        if index >= self.leaf_count {
            return Err(MerkleError::InvalidIndex {
                index,
                leaf_count: self.leaf_count,
            });
        }

        let mut current = self.padded_leaf_count - 1 + index;
        let mut path = Vec::with_capacity(self.depth());

        while current > 0 {
            // Odd indices are left children.
            let (sibling, position) = if current % 2 == 0 {
                (current - 1, SiblingPosition::Left)
            } else {
                (current + 1, SiblingPosition::Right)
            };
            path.push(ProofNode {
                hash: self.nodes[sibling],
                position,
            });
            current = (current - 1) / 2;
        }

        Ok(path)
    }

    /// Recompute the root from `leaf` and `path` and compare.
    pub fn verify_proof(leaf: &Hash, path: &[ProofNode], expected_root: &Hash) -> bool {
        let mut current = *leaf;
        for node in path {
            current = match node.position {
                SiblingPosition::Left => hash_pair(&node.hash, &current),
                SiblingPosition::Right => hash_pair(&current, &node.hash),
            };
        }
        current == *expected_root
    }

    /// Leaf index a proof path leads to, `None` if it does not fit a `usize`.
    pub fn leaf_index(path: &[ProofNode]) -> Option<usize> {
        path.iter()
            .enumerate()
            .try_fold(0usize, |index, (level, node)| match node.position {
                SiblingPosition::Left => {
                    let bit = u32::try_from(level).ok().and_then(|l| 1usize.checked_shl(l))?;
                    Some(index | bit)
                }
                SiblingPosition::Right => Some(index),
            })
    }
}

/// A single node in a Merkle proof path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    pub hash: Hash,
    pub position: SiblingPosition,
}

/// Side the sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiblingPosition {
    Left,
    Right,
}

/// `H(left || right)`
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update(left).update(right);
    hasher.finalize()
}
