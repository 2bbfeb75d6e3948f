//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error or a full `EnvFilter` string)
    pub log_level: String,

    /// Emit one JSON object per line instead of the human format
    pub json_logs: bool,

    /// Include file and line numbers in log output
    pub with_source_location: bool,

    /// Network identifier (mainnet, testnet, regtest)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ixian-node".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source_location: false,
            network: "testnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `IXI_SERVICE_NAME`: Service name (default: ixian-node)
    /// - `IXI_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `IXI_LOG_JSON`: Enable JSON logs (default: false, true in containers)
    /// - `IXI_LOG_SOURCE`: Include file/line in output (default: false)
    /// - `IXI_NETWORK`: Network name (default: testnet)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a closure over a map so they
    /// never touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("IXI_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("IXI_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("IXI_LOG_JSON")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),
            with_source_location: lookup("IXI_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.with_source_location),
            network: lookup("IXI_NETWORK").unwrap_or(defaults.network),
        }
    }

    /// Quiet configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            service_name: "ixian-node-test".to_string(),
            log_level: "warn".to_string(),
            ..Self::default()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
