//! # Threefold-Chain Telemetry
//!
//! Structured logging and Prometheus metrics shared by the node crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tc_telemetry::{init_logging, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `TC_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `TC_SERVICE_NAME` | `tfchain` | Service name attached to log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics, IndexMetrics, REGISTRY};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}
