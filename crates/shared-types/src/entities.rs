//! # Core Ledger Entities
//!
//! ## Clusters
//!
//! - **Primitives**: `Hash`, `PublicKey`, `Signature`
//! - **Identity**: `Party`
//! - **States**: `StateRef`
//! - **Time**: `TimeWindow`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Hash of all zeros. Marks an absent component group.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Short hex prefix of a hash, for logs.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

/// A well-known ledger participant: a legal name bound to a signing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Legal name, e.g. `O=Notary Service, L=Zurich, C=CH`.
    pub name: String,
    /// Ed25519 key the party signs with.
    pub owning_key: PublicKey,
}

impl Party {
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// CLUSTER C: STATES
// =============================================================================

/// Pointer to one output of a prior transaction. The unit of uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    /// Id of the transaction that produced the state.
    pub txhash: Hash,
    /// Output index within that transaction.
    pub index: u32,
}

impl StateRef {
    pub fn new(txhash: Hash, index: u32) -> Self {
        Self { txhash, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", hex::encode(self.txhash), self.index)
    }
}

// =============================================================================
// CLUSTER D: TIME
// =============================================================================

/// Interval during which a transaction may be notarised.
///
/// Times are unix milliseconds. `from_time` is inclusive, `until_time`
/// exclusive; either bound may be open but not both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from_time: Option<u64>,
    pub until_time: Option<u64>,
}

impl TimeWindow {
    /// Window `[from, until)`. Returns `None` unless `from < until`.
    pub fn between(from: u64, until: u64) -> Option<Self> {
        (from < until).then_some(Self {
            from_time: Some(from),
            until_time: Some(until),
        })
    }

    /// Open-ended window starting at `from`.
    pub fn from_only(from: u64) -> Self {
        Self {
            from_time: Some(from),
            until_time: None,
        }
    }

    /// Window that closes at `until`.
    pub fn until_only(until: u64) -> Self {
        Self {
            from_time: None,
            until_time: Some(until),
        }
    }

    /// Window centred on `time` with `tolerance` either side.
    pub fn with_tolerance(time: u64, tolerance: u64) -> Self {
        Self {
            from_time: Some(time.saturating_sub(tolerance)),
            until_time: Some(time.saturating_add(tolerance)),
        }
    }

    /// Whether `instant` lies inside the window.
    pub fn contains(&self, instant: u64) -> bool {
        let after_start = self.from_time.map_or(true, |from| instant >= from);
        let before_end = self.until_time.map_or(true, |until| instant < until);
        after_start && before_end
    }

    /// At least one bound is set, and `from < until` when both are.
    pub fn is_well_formed(&self) -> bool {
        match (self.from_time, self.until_time) {
            (None, None) => false,
            (Some(from), Some(until)) => from < until,
            _ => true,
        }
    }

    /// The window stretched by `tolerance` on each closed side.
    pub fn widened(&self, tolerance: u64) -> Self {
        Self {
            from_time: self.from_time.map(|from| from.saturating_sub(tolerance)),
            until_time: self.until_time.map(|until| until.saturating_add(tolerance)),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from_time, self.until_time) {
            (Some(from), Some(until)) => write!(f, "[{}, {})", from, until),
            (Some(from), None) => write!(f, "[{}, ∞)", from),
            (None, Some(until)) => write!(f, "(-∞, {})", until),
            (None, None) => write!(f, "(-∞, ∞)"),
        }
    }
}
