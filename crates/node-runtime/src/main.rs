//! # Ixian Node
//!
//! Entry point: load configuration, install logging, run until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + `IXI_*` environment)
//! 2. Initialize telemetry
//! 3. Wire subsystems and install genesis if needed
//! 4. Spawn maintenance, inbound and outbound tasks
//! 5. Wait for Ctrl+C, then shut down

use anyhow::{Context, Result};
use tracing::info;

use ixi_telemetry::init_telemetry;
use node_runtime::container::NodeConfig;
use node_runtime::NodeRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Invalid node configuration")?;
    init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let mut runtime = NodeRuntime::new(config);
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
