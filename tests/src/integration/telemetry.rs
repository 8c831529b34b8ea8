//! Index metrics as exported to Prometheus.

#[cfg(test)]
mod tests {
    use tc_telemetry::{encode_metrics, register_metrics, IndexMetrics};

    use crate::integration::fixtures::*;

    #[tokio::test]
    async fn test_index_counts_applied_and_reverted_blocks() {
        register_metrics().unwrap();
        let metrics = IndexMetrics::global();
        let applied = metrics.applied_blocks.get();
        let reverted = metrics.reverted_blocks.get();

        let mut chain = Chain::new();
        chain.mine(T0, vec![]).await.unwrap();
        chain.mine(T0 + 600, vec![]).await.unwrap();
        chain.revert(1);

        // other tests share the global counters
        assert!(metrics.applied_blocks.get() >= applied + 2);
        assert!(metrics.reverted_blocks.get() >= reverted + 1);

        let text = encode_metrics().unwrap();
        assert!(text.contains("tc_index_applied_blocks_total"));
        assert!(text.contains("tc_index_height"));
    }
}
