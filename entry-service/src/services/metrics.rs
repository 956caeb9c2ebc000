//! Prometheus metrics for entry-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter, TextEncoder,
};

pub static ENTRIES_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("entry_entries_created_total", "Total number of entries created")
        .expect("Failed to register entries_created")
});

pub static ENTRIES_UPDATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("entry_entries_updated_total", "Total number of entries updated")
        .expect("Failed to register entries_updated")
});

pub static ENTRIES_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("entry_entries_deleted_total", "Total number of entries deleted")
        .expect("Failed to register entries_deleted")
});

/// Rendered exports by report kind and document format.
pub static EXPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "entry_exports_total",
        "Total number of report exports",
        &["kind", "format"]
    )
    .expect("Failed to register exports_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "entry_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "entry_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&ENTRIES_CREATED);
    Lazy::force(&ENTRIES_UPDATED);
    Lazy::force(&ENTRIES_DELETED);
    Lazy::force(&EXPORTS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
