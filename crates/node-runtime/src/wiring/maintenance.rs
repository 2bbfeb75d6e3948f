//! Periodic maintenance of the pool, inventory cache and candidate block.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use ixi_02_transaction_pool::{CleanupReport, PendingReport, TransactionPoolApi};
use ixi_04_inventory::{CacheReport, InventoryApi};
use ixi_05_signature_freeze::{AcceptOutcome, SignatureFreezeApi};
use ixi_telemetry::{
    time_histogram, CHAIN_HEIGHT, MAINTENANCE_DURATION, MAINTENANCE_TICKS, PENDING_TRANSACTIONS,
    UNAPPLIED_TRANSACTIONS,
};
use shared_types::BlockChain;

use crate::container::NodeContainer;

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaintenanceReport {
    pub cleanup: CleanupReport,
    pub pending: PendingReport,
    pub cache: CacheReport,
    /// Block number committed from the local candidate, if any.
    pub accepted: Option<u64>,
}

/// Drives the periodic work of every subsystem.
pub struct MaintenanceLoop {
    container: Arc<NodeContainer>,
    interval: Duration,
}

impl MaintenanceLoop {
    pub fn new(container: Arc<NodeContainer>) -> Self {
        let interval = Duration::from_millis(container.config.runtime.maintenance_interval_ms);
        Self { container, interval }
    }

    /// Run one maintenance pass.
    ///
    /// Order matters: the candidate is accepted last so that transactions
    /// fetched by this tick's inventory retries are already in the pool.
    pub fn tick(&self) -> MaintenanceReport {
        let _timer = time_histogram!(MAINTENANCE_DURATION);
        let c = &self.container;

        let cleanup = c.pool.perform_cleanup();
        let pending = c.pool.process_pending_transactions();
        let cache = c.inventory.process_cache();

        let accepted = match c.freeze.accept_local_new_block() {
            Ok(AcceptOutcome::Accepted(block_num)) => {
                info!(block_num, "Candidate block accepted");
                Some(block_num)
            }
            Ok(AcceptOutcome::Pending { have, need }) => {
                debug!(have, need, "Candidate block waiting for signatures");
                None
            }
            Ok(AcceptOutcome::NoCandidate) => None,
            Err(e) => {
                warn!(error = %e, "Candidate block acceptance failed");
                None
            }
        };

        let counts = c.pool.counts();
        CHAIN_HEIGHT.set(c.collaborators.chain.last_block_num() as i64);
        UNAPPLIED_TRANSACTIONS.set(counts.unapplied as i64);
        PENDING_TRANSACTIONS.set(counts.pending as i64);
        MAINTENANCE_TICKS.inc();

        MaintenanceReport {
            cleanup,
            pending,
            cache,
            accepted,
        }
    }

    /// Tick on an interval until `shutdown` becomes `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "Maintenance loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Maintenance loop stopped");
    }
}
