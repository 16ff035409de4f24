//! # Notary Telemetry
//!
//! Structured logging for Notary-Chain services.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notary_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::for_subsystem("02", "notary");
//! init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `NC_SERVICE_NAME` | `notary-chain` | Service name in logs |
//! | `NC_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `NC_JSON_LOGS` | `false` | JSON formatted output |
//! | `NC_SUBSYSTEM_ID` | `00` | Subsystem identifier |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for a service.
///
/// Safe to call from tests that share a process: a second call reports
/// `SubscriberInit` instead of panicking.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)
}

/// Initialize logging for tests, ignoring "already installed" errors.
pub fn init_test_logging() {
    let config = TelemetryConfig {
        log_level: "debug".to_string(),
        ..TelemetryConfig::default()
    };
    let _ = logging::init_logging(&config);
}
