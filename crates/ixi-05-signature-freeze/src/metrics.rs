//! # Signature Freeze Metrics
//!
//! Enable with the `metrics` feature. Exported:
//!
//! - `ixi_freeze_signatures_accepted_total`
//! - `ixi_freeze_blocks_accepted_total`
//! - `ixi_freeze_blocks_rejected_total{reason}`
//! - `ixi_freeze_sigfreeze_updates_total`
//! - `ixi_freeze_lock_timeouts_total`

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref SIGNATURES_ACCEPTED: IntCounter = register_int_counter!(
        "ixi_freeze_signatures_accepted_total",
        "Block signatures added to a candidate or stored block"
    )
    .expect("Failed to create SIGNATURES_ACCEPTED metric");

    pub static ref BLOCKS_ACCEPTED: IntCounter = register_int_counter!(
        "ixi_freeze_blocks_accepted_total",
        "Candidate blocks committed and appended"
    )
    .expect("Failed to create BLOCKS_ACCEPTED metric");

    pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "ixi_freeze_blocks_rejected_total",
        "Candidate acceptance failures, by reason",
        &["reason"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref SIGFREEZE_UPDATES: IntCounter = register_int_counter!(
        "ixi_freeze_sigfreeze_updates_total",
        "Frozen signature sets replaced from sigfreeze announcements"
    )
    .expect("Failed to create SIGFREEZE_UPDATES metric");

    pub static ref LOCK_TIMEOUTS: IntCounter = register_int_counter!(
        "ixi_freeze_lock_timeouts_total",
        "Requests dropped waiting for the candidate lock"
    )
    .expect("Failed to create LOCK_TIMEOUTS metric");
}

#[cfg(feature = "metrics")]
pub fn record_signature_accepted() {
    SIGNATURES_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_accepted() {
    BLOCKS_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_sigfreeze_update() {
    SIGFREEZE_UPDATES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_lock_timeout() {
    LOCK_TIMEOUTS.inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_signature_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_sigfreeze_update() {}

#[cfg(not(feature = "metrics"))]
pub fn record_lock_timeout() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_callable() {
        record_signature_accepted();
        record_block_accepted();
        record_block_rejected("lock_timeout");
        record_sigfreeze_update();
        record_lock_timeout();
    }
}
