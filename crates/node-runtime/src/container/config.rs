//! # Node Configuration
//!
//! Unified configuration for every subsystem plus runtime timers.
//!
//! Defaults come from each subsystem's own `Default`; `from_env` then
//! applies `IXI_*` overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `IXI_NODE_TYPE` | `freeze.node_type` (`master`, `full`, `relay`, `client`, `worker`) |
//! | `IXI_REDACTED_WINDOW` | `pool.redacted_window_size` |
//! | `IXI_PRICE_PER_KB` | `pool.price_per_kb` (decimal coins) |
//! | `IXI_PREMINE_ADDRESSES` | `pool.premine_addresses` (comma-separated hex) |
//! | `IXI_MIN_BLOCK_SIGNATURES` | `freeze.min_block_signatures` |
//! | `IXI_INVENTORY_THROTTLE_MS` | `inventory.throttle_ms` |
//! | `IXI_INVENTORY_MAX_RETRIES` | `inventory.max_retries` |
//! | `IXI_MAX_MESSAGE_SIZE` | `protocol.max_message_size` |
//! | `IXI_MAINTENANCE_INTERVAL_MS` | `runtime.maintenance_interval_ms` |

use std::env;
use std::str::FromStr;

use ixi_02_transaction_pool::PoolConfig;
use ixi_04_inventory::InventoryConfig;
use ixi_05_signature_freeze::FreezeConfig;
use ixi_06_protocol::ProtocolConfig;
use ixi_telemetry::TelemetryConfig;
use shared_types::{Address, Amount, NodeType};
use thiserror::Error;

use crate::genesis::GenesisConfig;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub pool: PoolConfig,
    pub inventory: InventoryConfig,
    pub freeze: FreezeConfig,
    pub protocol: ProtocolConfig,
    pub telemetry: TelemetryConfig,
    pub runtime: RuntimeConfig,
    pub genesis: GenesisConfig,
}

/// Timers of the maintenance loop.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Interval between two maintenance ticks.
    pub maintenance_interval_ms: u64,
    /// Grace period for the loop to finish its tick on shutdown.
    pub shutdown_grace_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            maintenance_interval_ms: 1_000,
            shutdown_grace_ms: 2_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An override could not be parsed.
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// Parsed fine but violates a cross-field constraint.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

impl NodeConfig {
    /// Defaults plus `IXI_*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults plus overrides read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(raw) = lookup("IXI_NODE_TYPE") {
            config.freeze.node_type = parse_node_type(&raw)?;
        }
        override_parsed(&lookup, "IXI_REDACTED_WINDOW", &mut config.pool.redacted_window_size)?;
        if let Some(raw) = lookup("IXI_PRICE_PER_KB") {
            config.pool.price_per_kb = Amount::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                key: "IXI_PRICE_PER_KB",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(raw) = lookup("IXI_PREMINE_ADDRESSES") {
            config.pool.premine_addresses = parse_addresses(&raw)?;
        }
        override_parsed(
            &lookup,
            "IXI_MIN_BLOCK_SIGNATURES",
            &mut config.freeze.min_block_signatures,
        )?;
        override_parsed(&lookup, "IXI_INVENTORY_THROTTLE_MS", &mut config.inventory.throttle_ms)?;
        override_parsed(&lookup, "IXI_INVENTORY_MAX_RETRIES", &mut config.inventory.max_retries)?;
        override_parsed(&lookup, "IXI_MAX_MESSAGE_SIZE", &mut config.protocol.max_message_size)?;
        override_parsed(
            &lookup,
            "IXI_MAINTENANCE_INTERVAL_MS",
            &mut config.runtime.maintenance_interval_ms,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Small windows and fast timers for tests.
    pub fn for_testing() -> Self {
        Self {
            pool: PoolConfig::for_testing(),
            inventory: InventoryConfig::for_testing(),
            freeze: FreezeConfig::for_testing(),
            protocol: ProtocolConfig::for_testing(),
            telemetry: TelemetryConfig::for_testing(),
            runtime: RuntimeConfig {
                maintenance_interval_ms: 10,
                shutdown_grace_ms: 100,
            },
            genesis: GenesisConfig::default(),
        }
    }

    /// Cross-field checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.redacted_window_size == 0 {
            return Err(ConfigError::Inconsistent(
                "redacted window must cover at least one block".to_string(),
            ));
        }
        if self.runtime.maintenance_interval_ms == 0 {
            return Err(ConfigError::Inconsistent(
                "maintenance interval must be positive".to_string(),
            ));
        }
        if self.freeze.required_signature_percent > 100 {
            return Err(ConfigError::Inconsistent(format!(
                "required signature percent {} exceeds 100",
                self.freeze.required_signature_percent
            )));
        }
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn parse_node_type(raw: &str) -> Result<NodeType, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "master" | "m" => Ok(NodeType::Master),
        "full" | "h" => Ok(NodeType::Full),
        "relay" | "r" => Ok(NodeType::Relay),
        "client" | "c" => Ok(NodeType::Client),
        "worker" | "w" => Ok(NodeType::Worker),
        _ => Err(ConfigError::InvalidValue {
            key: "IXI_NODE_TYPE",
            value: raw.to_string(),
            reason: "unknown node type".to_string(),
        }),
    }
}

fn parse_addresses(raw: &str) -> Result<Vec<Address>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Address::from_hex(s).map_err(|e| ConfigError::InvalidValue {
                key: "IXI_PREMINE_ADDRESSES",
                value: s.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
