//! # Inventory Metrics
//!
//! Enable with the `metrics` feature. Exported:
//!
//! - `ixi_inventory_items_received_total{type}`
//! - `ixi_inventory_requests_sent_total{code}`
//! - `ixi_inventory_items_dropped_total`

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref ITEMS_RECEIVED: IntCounterVec = register_int_counter_vec!(
        "ixi_inventory_items_received_total",
        "Announced inventory items seen for the first time, by type",
        &["type"]
    )
    .expect("Failed to create ITEMS_RECEIVED metric");

    pub static ref REQUESTS_SENT: IntCounterVec = register_int_counter_vec!(
        "ixi_inventory_requests_sent_total",
        "Content requests sent for announced items, by message code",
        &["code"]
    )
    .expect("Failed to create REQUESTS_SENT metric");

    pub static ref ITEMS_DROPPED: IntCounter = register_int_counter!(
        "ixi_inventory_items_dropped_total",
        "Unprocessed items evicted after exhausting their retries"
    )
    .expect("Failed to create ITEMS_DROPPED metric");
}

#[cfg(feature = "metrics")]
pub fn record_item_received(item_type: &str) {
    ITEMS_RECEIVED.with_label_values(&[item_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_request_sent(code: &str) {
    REQUESTS_SENT.with_label_values(&[code]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_items_dropped(count: usize) {
    ITEMS_DROPPED.inc_by(count as u64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_item_received(_item_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_request_sent(_code: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_items_dropped(_count: usize) {}
