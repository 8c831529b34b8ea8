//! Prometheus metrics for the transaction index.
//!
//! Metric names follow `tc_<component>_<metric>[_total]`.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    static ref INDEX_METRICS: IndexMetrics = IndexMetrics {
        applied_blocks: IntCounter::new(
            "tc_index_applied_blocks_total",
            "Blocks applied to the transaction index"
        ).expect("metric creation failed"),
        reverted_blocks: IntCounter::new(
            "tc_index_reverted_blocks_total",
            "Blocks reverted from the transaction index"
        ).expect("metric creation failed"),
        failed_batches: IntCounter::new(
            "tc_index_failed_batches_total",
            "Consensus changes that failed and were not committed"
        ).expect("metric creation failed"),
        height: IntGauge::new(
            "tc_index_height",
            "Block height of the last committed consensus change"
        ).expect("metric creation failed"),
    };
}

/// Counters updated by the transaction index after every consensus change.
#[derive(Clone)]
pub struct IndexMetrics {
    pub applied_blocks: IntCounter,
    pub reverted_blocks: IntCounter,
    pub failed_batches: IntCounter,
    pub height: IntGauge,
}

impl IndexMetrics {
    /// Process-wide instance. Unregistered metrics still count.
    pub fn global() -> &'static IndexMetrics {
        &INDEX_METRICS
    }

    /// Record a committed consensus change.
    pub fn record_change(&self, reverted: usize, applied: usize, height: u64) {
        self.reverted_blocks.inc_by(reverted as u64);
        self.applied_blocks.inc_by(applied as u64);
        self.height.set(i64::try_from(height).unwrap_or(i64::MAX));
    }

    pub fn record_failure(&self) {
        self.failed_batches.inc();
    }
}

/// Register the index metrics with [`REGISTRY`]. Repeated calls are no-ops.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics = IndexMetrics::global();
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(metrics.applied_blocks.clone()),
        Box::new(metrics.reverted_blocks.clone()),
        Box::new(metrics.failed_batches.clone()),
        Box::new(metrics.height.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_record_change() {
        let metrics = IndexMetrics::global();
        let applied = metrics.applied_blocks.get();
        metrics.record_change(1, 3, 42);
        assert!(metrics.applied_blocks.get() >= applied + 3);
    }

    #[test]
    fn test_encode_contains_index_metrics() {
        register_metrics().unwrap();
        IndexMetrics::global().record_failure();
        let text = encode_metrics().unwrap();
        assert!(text.contains("tc_index_failed_batches_total"));
    }
}
