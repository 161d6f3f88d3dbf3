//! # Hyperdrive Telemetry
//!
//! Structured logging for Hyperdrive binaries.
//!
//! Library crates only emit `tracing` events; binaries call [`init_tracing`]
//! once at startup to decide where they go.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hd_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_tracing(&TelemetryConfig::for_service("hd-localnet"))?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `hyperdrive` | Service name in the startup record |
//! | `HD_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `HD_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `HD_JSON_LOGS` | `false` | JSON lines output |

#![warn(missing_docs)]

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed
    #[error("Tracing already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Convenience macro for creating a span with replica context.
///
/// # Example
///
/// ```rust,ignore
/// use hd_telemetry::replica_span;
///
/// let _span = replica_span!("worker", shard = %shard_hash, signatory = %me).entered();
/// ```
#[macro_export]
macro_rules! replica_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
