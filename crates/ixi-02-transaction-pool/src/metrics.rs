//! # Transaction Pool Metrics
//!
//! Enable with the `metrics` feature. Exported:
//!
//! - `ixi_pool_transactions_accepted_total`
//! - `ixi_pool_transactions_rejected_total{reason}`
//! - `ixi_pool_blocks_applied_total`
//! - `ixi_pool_blocks_rejected_total{reason}`
//! - `ixi_pool_pending_rebroadcasts_total`

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref TRANSACTIONS_ACCEPTED: IntCounter = register_int_counter!(
        "ixi_pool_transactions_accepted_total",
        "Transactions accepted into the unapplied pool"
    )
    .expect("Failed to create TRANSACTIONS_ACCEPTED metric");

    pub static ref TRANSACTIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "ixi_pool_transactions_rejected_total",
        "Transactions rejected, by reason",
        &["reason"]
    )
    .expect("Failed to create TRANSACTIONS_REJECTED metric");

    pub static ref BLOCKS_APPLIED: IntCounter = register_int_counter!(
        "ixi_pool_blocks_applied_total",
        "Blocks whose transactions were committed"
    )
    .expect("Failed to create BLOCKS_APPLIED metric");

    pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "ixi_pool_blocks_rejected_total",
        "Blocks refused by the application engine, by reason",
        &["reason"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref PENDING_REBROADCASTS: IntCounter = register_int_counter!(
        "ixi_pool_pending_rebroadcasts_total",
        "Re-broadcasts of unconfirmed local transactions"
    )
    .expect("Failed to create PENDING_REBROADCASTS metric");
}

#[cfg(feature = "metrics")]
pub fn record_transaction_accepted() {
    TRANSACTIONS_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_transaction_rejected(reason: &str) {
    TRANSACTIONS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_applied() {
    BLOCKS_APPLIED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_pending_rebroadcast() {
    PENDING_REBROADCASTS.inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_transaction_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_transaction_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_applied() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_pending_rebroadcast() {}
