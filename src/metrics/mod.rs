// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

use crate::cache::CacheStats;

pub use registry::{
    gather_metrics,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    EXTRACTIONS_TOTAL,
    EXTRACTION_DURATION,
    TOKENS_TOTAL,
    CACHE_OPERATIONS,
    CACHE_ENTRIES,
    CACHE_SAVINGS,
};

/// Helper to record request metrics
pub fn record_request(method: &str, endpoint: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

/// Helper to record an extraction call
pub fn record_extraction(model: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "error" };
    EXTRACTIONS_TOTAL.with_label_values(&[model, status]).inc();
    EXTRACTION_DURATION
        .with_label_values(&[model])
        .observe(duration_secs);
}

/// Helper to record token counts by kind
pub fn record_tokens(model: &str, kind: &str, count: u64) {
    if count > 0 {
        TOKENS_TOTAL
            .with_label_values(&[model, kind])
            .inc_by(count as f64);
    }
}

/// Helper to record ledger operations
pub fn record_cache_operation(operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[operation]).inc();
}

pub fn record_cache_operations(operation: &str, count: usize) {
    if count > 0 {
        CACHE_OPERATIONS
            .with_label_values(&[operation])
            .inc_by(count as f64);
    }
}

/// Publish a ledger snapshot to the gauges
pub fn update_cache_stats(stats: &CacheStats) {
    CACHE_ENTRIES
        .with_label_values(&["active"])
        .set(stats.active_entries as f64);
    CACHE_SAVINGS.with_label_values(&["gross"]).set(stats.gross_cost_saved);
    CACHE_SAVINGS.with_label_values(&["storage"]).set(stats.storage_cost);
    CACHE_SAVINGS.with_label_values(&["net"]).set(stats.net_savings);
}
