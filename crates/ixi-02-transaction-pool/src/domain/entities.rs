//! Pool configuration and value types.

use shared_types::{Address, Amount};

pub use shared_types::Timestamp;

/// Transaction pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Trailing blocks whose transactions stay live in the applied map.
    pub redacted_window_size: u64,
    /// Fee per started kilobyte of encoded transaction.
    pub price_per_kb: Amount,
    /// Wallets subject to the premine spending floor.
    pub premine_addresses: Vec<Address>,
    /// Annual staking inflation in parts per million of total supply.
    pub staking_inflation_ppm: u64,
    /// Blocks produced per year at the target block time.
    pub blocks_per_year: u64,
    /// Re-broadcast an unconfirmed local transaction after this long.
    pub pending_rebroadcast_ms: u64,
    /// Ask peers about an unconfirmed local transaction after this long.
    pub pending_inquiry_ms: u64,
    /// Stop resending once this many peers confirmed the transaction.
    pub pending_confirmations: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            redacted_window_size: 43_200,
            price_per_kb: Amount::from_units(5_000),
            premine_addresses: Vec::new(),
            staking_inflation_ppm: 100_000,
            blocks_per_year: 1_051_200,
            pending_rebroadcast_ms: 40_000,
            pending_inquiry_ms: 20_000,
            pending_confirmations: 3,
        }
    }
}

impl PoolConfig {
    /// Small window and fast timers for tests.
    pub fn for_testing() -> Self {
        Self {
            redacted_window_size: 1_000,
            ..Default::default()
        }
    }
}

/// How `apply_transactions_from_block` treats a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Keep wallet effects and move transactions to the applied map.
    Commit,
    /// Dry run: validate, then revert every wallet effect.
    Verify,
}

/// Map sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolCounts {
    pub unapplied: usize,
    /// Live applied entries (tombstones excluded).
    pub applied: usize,
    pub tombstones: usize,
    pub pending: usize,
}

/// Result of one `perform_cleanup` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub stale_pow_solutions: usize,
    pub expired: usize,
    pub redacted: usize,
}

/// Result of one `process_pending_transactions` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingReport {
    pub rebroadcast: usize,
    pub inquiries: usize,
    pub dropped: usize,
}
