//! # Node Runtime Library
//!
//! Wiring, configuration and long-running tasks of the Ixian node. The
//! `main.rs` binary is a thin shell around [`NodeRuntime`].
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal Architecture**: subsystems own their ports, this crate
//!   supplies the adapters and wires them together
//! - **Explicit state**: every subsystem is an `Arc` held by [`NodeContainer`],
//!   no globals apart from Prometheus metrics

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod wiring;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use shared_types::BlockChain;

use crate::adapters::{ChannelNetwork, OutboundMessage};
use crate::container::{NodeCollaborators, NodeConfig, NodeContainer};
use crate::genesis::{GenesisBuilder, GenesisError};
use crate::wiring::{InboundDispatcher, InboundMessage, MaintenanceLoop};

pub use container::{ConfigError, RuntimeConfig};

/// Inbound frames buffered before the transport is back-pressured.
pub const INBOUND_QUEUE_CAPACITY: usize = 1_024;

/// The node runtime orchestrating all subsystems.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    dispatcher: Option<InboundDispatcher>,
    outbound_rx: Option<mpsc::UnboundedReceiver<OutboundMessage>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    /// Create the runtime with in-memory collaborators and a channel network.
    pub fn new(config: NodeConfig) -> Self {
        info!("Creating Ixian node runtime");

        let (network, outbound_rx) = ChannelNetwork::new();
        let collaborators = NodeCollaborators::in_memory(Arc::new(network));
        let container = Arc::new(NodeContainer::new(config, collaborators));

        let (dispatcher, inbound_tx) =
            InboundDispatcher::new(container.protocol.clone(), INBOUND_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            container,
            inbound_tx,
            dispatcher: Some(dispatcher),
            outbound_rx: Some(outbound_rx),
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Install genesis if the chain is empty.
    pub fn initialize_genesis(&self) -> Result<(), GenesisError> {
        let c = &self.container.collaborators;
        match GenesisBuilder::new(self.container.config.genesis.clone())
            .install(c.chain.as_ref(), c.wallets.as_ref())
        {
            Ok(_) => Ok(()),
            Err(GenesisError::AlreadyExists(height)) => {
                info!(height, "Chain already initialized");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Start the node.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Install genesis (if the chain is empty)
    /// 2. Spawn the maintenance loop
    /// 3. Spawn the inbound dispatcher
    /// 4. Spawn the outbound drain (stands in for the transport)
    pub async fn start(&mut self) -> anyhow::Result<()> {
        info!("===========================================");
        info!("  Ixian Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.initialize_genesis()?;

        let maintenance = MaintenanceLoop::new(self.container.clone());
        let shutdown = self.shutdown_rx.clone();
        self.tasks.push(tokio::spawn(async move {
            maintenance.run(shutdown).await;
        }));

        if let Some(dispatcher) = self.dispatcher.take() {
            let shutdown = self.shutdown_rx.clone();
            self.tasks.push(tokio::spawn(async move {
                dispatcher.run(shutdown).await;
            }));
        }

        if let Some(mut outbound) = self.outbound_rx.take() {
            let mut shutdown = self.shutdown_rx.clone();
            self.tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        message = outbound.recv() => {
                            let Some(message) = message else { break };
                            debug!(
                                code = %message.code,
                                target = ?message.target,
                                bytes = message.payload.len(),
                                "Outbound message (no transport attached)"
                            );
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }

        info!(
            node_type = ?self.container.config.freeze.node_type,
            height = self.container.collaborators.chain.last_block_num(),
            "All subsystems initialized and running"
        );
        Ok(())
    }

    /// Sender the transport pushes inbound frames into.
    pub fn inbound(&self) -> mpsc::Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    /// Shut the node down gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal shutdown to every task
    /// 2. Wait for them, bounded by `shutdown_grace_ms`
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let grace = Duration::from_millis(self.container.config.runtime.shutdown_grace_ms);
        for task in self.tasks.drain(..) {
            match tokio::time::timeout(grace, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Task ended abnormally"),
                Err(_) => warn!("Task did not stop within the grace period"),
            }
        }

        info!("Shutdown complete");
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }
}
