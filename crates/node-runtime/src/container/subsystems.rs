//! # Subsystem Container
//!
//! Holds every subsystem and the collaborator adapters they share.
//!
//! ## Initialization Order
//!
//! Subsystems are built leaves first; each receives the `Arc`s of the
//! ones below it:
//!
//! ```text
//! Level 0: chain, wallets, storage, presence, network, time, crypto
//! Level 1: Transaction Pool (ixi-02)
//! Level 2: Signature Freeze (ixi-05)       ← pool
//! Level 3: Inventory (ixi-04)              ← pool, freeze (SignatureLookup)
//! Level 4: Protocol handlers (ixi-06)      ← pool, inventory, freeze
//! ```
//!
//! ## Thread Safety
//!
//! - All subsystems wrapped in `Arc` for shared ownership
//! - Each subsystem guards its own state; the container adds no locks

use std::sync::Arc;

use tracing::info;

use ixi_02_transaction_pool::{
    InMemoryActivityLog, PoolDependencies, TracingEvents, TransactionPoolService,
};
use ixi_04_inventory::{InventoryDependencies, InventoryService, PoolTransactionLookup};
use ixi_05_signature_freeze::{FreezeDependencies, SignatureFreezeCoordinator};
use ixi_06_protocol::{ProtocolDependencies, ProtocolMessageHandler};
use shared_crypto::{Ed25519Verifier, HashTargetPowVerifier, PowVerifier, SignatureVerifier};
use shared_types::in_memory::{
    InMemoryBlockChain, InMemoryPresenceDirectory, InMemoryTransactionStorage,
    InMemoryWalletState,
};
use shared_types::{
    BlockChain, PeerNetwork, PresenceDirectory, SystemTimeSource, TimeSource, TransactionStorage,
    WalletState,
};

use crate::container::config::NodeConfig;

/// Collaborator ports handed to the subsystems.
#[derive(Clone)]
pub struct NodeCollaborators {
    pub chain: Arc<dyn BlockChain>,
    pub wallets: Arc<dyn WalletState>,
    pub storage: Arc<dyn TransactionStorage>,
    pub presence: Arc<dyn PresenceDirectory>,
    pub network: Arc<dyn PeerNetwork>,
    pub time: Arc<dyn TimeSource>,
    pub signatures: Arc<dyn SignatureVerifier>,
    pub pow: Arc<dyn PowVerifier>,
}

impl NodeCollaborators {
    /// In-memory storage with the given network adapter and the wall clock.
    pub fn in_memory(network: Arc<dyn PeerNetwork>) -> Self {
        Self {
            chain: Arc::new(InMemoryBlockChain::new()),
            wallets: Arc::new(InMemoryWalletState::new()),
            storage: Arc::new(InMemoryTransactionStorage::new()),
            presence: Arc::new(InMemoryPresenceDirectory::new()),
            network,
            time: Arc::new(SystemTimeSource),
            signatures: Arc::new(Ed25519Verifier),
            pow: Arc::new(HashTargetPowVerifier),
        }
    }
}

/// Central container holding all subsystem instances.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub collaborators: NodeCollaborators,
    pub activity: Arc<InMemoryActivityLog>,
    pub pool: Arc<TransactionPoolService>,
    pub freeze: Arc<SignatureFreezeCoordinator>,
    pub inventory: Arc<InventoryService>,
    pub protocol: Arc<ProtocolMessageHandler>,
}

impl NodeContainer {
    /// Wire every subsystem on top of `collaborators`.
    pub fn new(config: NodeConfig, collaborators: NodeCollaborators) -> Self {
        let c = &collaborators;
        let activity = Arc::new(InMemoryActivityLog::new());

        let pool = Arc::new(TransactionPoolService::new(
            PoolDependencies {
                chain: c.chain.clone(),
                wallets: c.wallets.clone(),
                storage: c.storage.clone(),
                network: c.network.clone(),
                signatures: c.signatures.clone(),
                pow: c.pow.clone(),
                events: Arc::new(TracingEvents),
                activity: activity.clone(),
                time: c.time.clone(),
            },
            config.pool.clone(),
        ));
        info!(
            redacted_window = config.pool.redacted_window_size,
            "[ixi-02] Transaction pool initialized"
        );

        let freeze = Arc::new(SignatureFreezeCoordinator::new(
            config.freeze.clone(),
            FreezeDependencies {
                chain: c.chain.clone(),
                pool: pool.clone(),
                wallets: c.wallets.clone(),
                presence: c.presence.clone(),
                signatures: c.signatures.clone(),
                network: c.network.clone(),
            },
        ));
        info!(
            node_type = ?config.freeze.node_type,
            min_signatures = config.freeze.min_block_signatures,
            "[ixi-05] Signature freeze coordinator initialized"
        );

        let inventory = Arc::new(InventoryService::new(
            config.inventory.clone(),
            InventoryDependencies {
                chain: c.chain.clone(),
                presence: c.presence.clone(),
                signatures: freeze.clone(),
                transactions: Arc::new(PoolTransactionLookup::new(pool.clone())),
                network: c.network.clone(),
                time: c.time.clone(),
            },
        ));
        info!(
            throttle_ms = config.inventory.throttle_ms,
            "[ixi-04] Inventory cache initialized"
        );

        let protocol = Arc::new(ProtocolMessageHandler::new(
            config.protocol.clone(),
            ProtocolDependencies {
                chain: c.chain.clone(),
                pool: pool.clone(),
                inventory: inventory.clone(),
                freeze: freeze.clone(),
                presence: c.presence.clone(),
                network: c.network.clone(),
            },
        ));
        info!(
            max_message_size = config.protocol.max_message_size,
            "[ixi-06] Protocol handlers initialized"
        );

        Self {
            config,
            collaborators,
            activity,
            pool,
            freeze,
            inventory,
            protocol,
        }
    }
}
