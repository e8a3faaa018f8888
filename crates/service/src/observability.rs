use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static CACHE_HITS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_list_cache_hits_total",
        "Price requests answered from the in-memory cache"
    )
    .expect("register cache_hits_total")
});

pub static CACHE_MISSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_list_cache_misses_total",
        "Price requests that triggered a spreadsheet fetch"
    )
    .expect("register cache_misses_total")
});

pub static UPSTREAM_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_list_upstream_errors_total",
        "Failed spreadsheet fetches"
    )
    .expect("register upstream_errors_total")
});

pub static SNAPSHOT_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_list_snapshot_errors_total",
        "Snapshot writes that failed and were skipped"
    )
    .expect("register snapshot_errors_total")
});

pub static REFRESH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "price_list_refresh_duration_seconds",
        "Spreadsheet fetch duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register refresh_duration")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
