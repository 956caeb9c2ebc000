//! Prometheus metrics for entry-gateway.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Forwarded requests by upstream status (or `unreachable`).
pub static UPSTREAM_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gateway_upstream_requests_total",
        "Total number of requests forwarded to entry-service",
        &["method", "status"]
    )
    .expect("Failed to register upstream_requests_total")
});

/// Time until upstream response headers arrive.
pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "gateway_upstream_duration_seconds",
        "Upstream response time in seconds",
        &["method"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register upstream_duration")
});

pub fn init_metrics() {
    Lazy::force(&UPSTREAM_REQUESTS_TOTAL);
    Lazy::force(&UPSTREAM_DURATION);
}

pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&prometheus::gather())
        .unwrap_or_default()
}
