// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, HistogramVec, GaugeVec, Opts, Registry, TextEncoder, Encoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_gauge_vec_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP METRICS
    // ============================================================================

    /// Total number of API requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("requests_total", "Total number of API requests"),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "endpoint"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // EXTRACTION METRICS
    // ============================================================================

    /// Extraction jobs by outcome
    pub static ref EXTRACTIONS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("extractions_total", "Total extraction jobs"),
        &["model", "status"], // status: success, error
        REGISTRY
    ).unwrap();

    /// Extraction call duration
    pub static ref EXTRACTION_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("extraction_duration_seconds", "Extraction call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["model"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // TOKEN METRICS
    // ============================================================================

    /// Tokens by model and kind
    pub static ref TOKENS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("tokens_total", "Total tokens processed"),
        &["model", "type"], // type: estimated_input, input, output, cached, saved
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE LEDGER METRICS
    // ============================================================================

    /// Ledger operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total cache ledger operations"),
        &["operation"], // operation: hit, miss, create, refresh, expire, evict, delete
        REGISTRY
    ).unwrap();

    /// Live ledger entries
    pub static ref CACHE_ENTRIES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("cache_entries", "Number of tracked cache entries"),
        &["state"],
        REGISTRY
    ).unwrap();

    /// Running cost estimates in USD
    pub static ref CACHE_SAVINGS: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("cache_savings_usd", "Estimated cache savings and costs in USD"),
        &["kind"], // kind: gross, storage, net
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Touch vector metrics so they appear in the output
        CACHE_OPERATIONS.with_label_values(&["hit"]).inc_by(0.0);
        TOKENS_TOTAL.with_label_values(&["test-model", "input"]).inc_by(0.0);
        CACHE_SAVINGS.with_label_values(&["net"]).set(0.0);

        let metrics = gather_metrics();
        assert!(metrics.contains("cache_operations_total"));
        assert!(metrics.contains("tokens_total"));
        assert!(metrics.contains("cache_savings_usd"));
    }
}
