//! # Ixian Telemetry
//!
//! Logging and metrics setup shared by the node binary and tests.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, human or JSON output
//! - **Metrics**: Prometheus gauges for node-wide state, plus a text
//!   renderer for every counter the subsystem crates register
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ixi_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // tracing macros now go to stdout, gather_metrics() renders the registry
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IXI_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `IXI_LOG_JSON` | `false` (`true` in containers) | JSON log lines |
//! | `IXI_LOG_SOURCE` | `false` | File and line in log lines |
//! | `IXI_SERVICE_NAME` | `ixian-node` | Service name |
//! | `IXI_NETWORK` | `testnet` | Network name |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    gather_metrics, HistogramTimer, CHAIN_HEIGHT, MAINTENANCE_DURATION, MAINTENANCE_TICKS,
    PENDING_TRANSACTIONS, UNAPPLIED_TRANSACTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to encode metrics: {0}")]
    MetricsEncode(String),
}

/// Initialize logging and touch the node gauges so they appear in the
/// first scrape even before the maintenance loop sets them.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    CHAIN_HEIGHT.set(0);
    UNAPPLIED_TRANSACTIONS.set(0);
    PENDING_TRANSACTIONS.set(0);
    Ok(())
}
