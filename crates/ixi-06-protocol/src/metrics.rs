//! # Protocol Metrics
//!
//! Enable with the `metrics` feature. Exported:
//!
//! - `ixi_protocol_messages_total{code}`
//! - `ixi_protocol_messages_dropped_total{reason}`
//! - `ixi_protocol_replies_total{code}`

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter_vec, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref MESSAGES: IntCounterVec = register_int_counter_vec!(
        "ixi_protocol_messages_total",
        "Inbound messages handled, by code",
        &["code"]
    )
    .expect("Failed to create MESSAGES metric");

    pub static ref MESSAGES_DROPPED: IntCounterVec = register_int_counter_vec!(
        "ixi_protocol_messages_dropped_total",
        "Inbound messages dropped, by reason",
        &["reason"]
    )
    .expect("Failed to create MESSAGES_DROPPED metric");

    pub static ref REPLIES: IntCounterVec = register_int_counter_vec!(
        "ixi_protocol_replies_total",
        "Replies sent to requesting peers, by code",
        &["code"]
    )
    .expect("Failed to create REPLIES metric");
}

#[cfg(feature = "metrics")]
pub fn record_message(code: &str) {
    MESSAGES.with_label_values(&[code]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_dropped(reason: &str) {
    MESSAGES_DROPPED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_reply(code: &str) {
    REPLIES.with_label_values(&[code]).inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_message(_code: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_dropped(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reply(_code: &str) {}
