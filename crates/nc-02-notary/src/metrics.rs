//! # Notary Metrics
//!
//! Prometheus metrics for notarisation throughput and rejections.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! nc-02-notary = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `notary_requests_received_total` - Counter of payloads received
//! - `notary_transactions_committed_total` - Counter of committed transactions
//! - `notary_requests_rejected_total` - Counter of rejections (by reason)
//! - `notary_conflicting_states_total` - Counter of inputs reported in conflicts
//! - `notary_active_flows` - Gauge of notarisation flows in progress

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, IntCounter,
    IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total notarisation payloads received
    pub static ref REQUESTS_RECEIVED: IntCounter = register_int_counter!(
        "notary_requests_received_total",
        "Total number of notarisation payloads received"
    )
    .expect("Failed to create REQUESTS_RECEIVED metric");

    /// Total transactions committed
    pub static ref TRANSACTIONS_COMMITTED: IntCounter = register_int_counter!(
        "notary_transactions_committed_total",
        "Total number of transactions committed"
    )
    .expect("Failed to create TRANSACTIONS_COMMITTED metric");

    /// Total rejections, labeled by reason
    pub static ref REQUESTS_REJECTED: CounterVec = register_counter_vec!(
        "notary_requests_rejected_total",
        "Total number of notarisation requests rejected",
        &["reason"]
    )
    .expect("Failed to create REQUESTS_REJECTED metric");

    /// Total input states reported as already consumed
    pub static ref CONFLICTING_STATES: IntCounter = register_int_counter!(
        "notary_conflicting_states_total",
        "Total number of input states reported in conflicts"
    )
    .expect("Failed to create CONFLICTING_STATES metric");

    /// Notarisation flows in progress
    pub static ref ACTIVE_FLOWS: IntGauge = register_int_gauge!(
        "notary_active_flows",
        "Number of notarisation flows in progress"
    )
    .expect("Failed to create ACTIVE_FLOWS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a payload received
#[cfg(feature = "metrics")]
pub fn record_request_received() {
    REQUESTS_RECEIVED.inc();
    ACTIVE_FLOWS.inc();
}

/// Record a committed transaction
#[cfg(feature = "metrics")]
pub fn record_committed() {
    TRANSACTIONS_COMMITTED.inc();
    ACTIVE_FLOWS.dec();
}

/// Record a rejection with reason
#[cfg(feature = "metrics")]
pub fn record_rejected(reason: &str) {
    REQUESTS_REJECTED.with_label_values(&[reason]).inc();
    ACTIVE_FLOWS.dec();
}

/// Record inputs reported in a conflict
#[cfg(feature = "metrics")]
pub fn record_conflicting_states(count: usize) {
    CONFLICTING_STATES.inc_by(count as u64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_request_received() {}

#[cfg(not(feature = "metrics"))]
pub fn record_committed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_conflicting_states(_count: usize) {}
