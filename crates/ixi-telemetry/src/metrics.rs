//! Node-level Prometheus metrics.
//!
//! Subsystem crates register their own counters on the default registry
//! when built with their `metrics` feature (`ixi_pool_*`, `ixi_inventory_*`,
//! `ixi_freeze_*`, `ixi_protocol_*`). This module adds the gauges only the
//! runtime can observe and renders the whole registry.
//!
//! All metrics follow the naming convention `ixi_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, register_histogram, register_int_counter, register_int_gauge, Encoder,
    Histogram, IntCounter, IntGauge, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Height of the last stored block
    pub static ref CHAIN_HEIGHT: IntGauge = register_int_gauge!(
        "ixi_node_chain_height",
        "Height of the last stored block"
    )
    .expect("Failed to create CHAIN_HEIGHT metric");

    /// Unapplied pool size
    pub static ref UNAPPLIED_TRANSACTIONS: IntGauge = register_int_gauge!(
        "ixi_node_unapplied_transactions",
        "Transactions waiting for block inclusion"
    )
    .expect("Failed to create UNAPPLIED_TRANSACTIONS metric");

    /// Local transactions awaiting confirmation
    pub static ref PENDING_TRANSACTIONS: IntGauge = register_int_gauge!(
        "ixi_node_pending_transactions",
        "Locally originated transactions awaiting peer confirmation"
    )
    .expect("Failed to create PENDING_TRANSACTIONS metric");

    /// Completed maintenance ticks
    pub static ref MAINTENANCE_TICKS: IntCounter = register_int_counter!(
        "ixi_node_maintenance_ticks_total",
        "Completed maintenance loop iterations"
    )
    .expect("Failed to create MAINTENANCE_TICKS metric");

    /// Duration of one maintenance tick
    pub static ref MAINTENANCE_DURATION: Histogram = register_histogram!(
        "ixi_node_maintenance_duration_seconds",
        "Time spent in one maintenance loop iteration",
        exponential_buckets(0.0001, 2.0, 16).unwrap_or_default()
    )
    .expect("Failed to create MAINTENANCE_DURATION metric");
}

/// Render every metric in the default registry in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsEncode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsEncode(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
