//! Structured logging setup.
//!
//! Every crate logs through `tracing` macros with key/value fields. This
//! module installs the global subscriber that renders them:
//!
//! | `json_logs` | Output |
//! |-------------|--------|
//! | `false` | human-readable, ANSI colours, target shown |
//! | `true` | one JSON object per line with thread ids (for log shippers) |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the level filter for `config`.
///
/// `RUST_LOG` directives are already folded into `log_level` by
/// [`TelemetryConfig::from_env`], so only the configured string is parsed.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{}: {}", config.log_level, e)))
}

/// Install the global `tracing` subscriber.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] when a subscriber is
/// already installed (second call, or a test harness that set its own).
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Log a block-related event with standard fields.
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $msg:expr, $block_num:expr, $checksum:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            block_num = $block_num,
            checksum = %$checksum,
            $($($field)*,)?
            $msg
        )
    };
}
