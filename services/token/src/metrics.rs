//! Prometheus metrics for the access token service.
//!
//! Provides counters and histograms, plus the separately served `/metrics`
//! exporter.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "nrf_access_tokens_issued_total",
        "Total number of access tokens issued",
        &["algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Rejected token requests counter.
pub static TOKEN_REJECTIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "nrf_access_token_rejections_total",
        "Total number of rejected access token requests",
        &["error"]
    )
    .expect("Failed to register token_rejections metric")
});

/// Signing latency histogram.
pub static SIGNING_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "nrf_access_token_signing_seconds",
        "Time spent signing access tokens in seconds",
        vec![0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05]
    )
    .expect("Failed to register signing_latency metric")
});

/// Registry lookups counter.
pub static REGISTRY_LOOKUPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "nrf_registry_lookups_total",
        "Total number of NF registry lookups",
        &["role", "outcome"]
    )
    .expect("Failed to register registry_lookups metric")
});

/// HTTP responses counter.
pub static HTTP_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "nrf_http_requests_total",
        "Total number of access token HTTP requests by status",
        &["status"]
    )
    .expect("Failed to register http_requests metric")
});

/// Record a token issuance.
pub fn record_token_issued(algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[algorithm]).inc();
}

/// Record a rejected request.
pub fn record_rejection(error: &str) {
    TOKEN_REJECTIONS.with_label_values(&[error]).inc();
}

/// Record signing latency.
pub fn record_signing_latency(duration_secs: f64) {
    SIGNING_LATENCY.observe(duration_secs);
}

/// Record a registry lookup.
pub fn record_registry_lookup(role: &str, outcome: &str) {
    REGISTRY_LOOKUPS.with_label_values(&[role, outcome]).inc();
}

/// Record an HTTP response status.
pub fn record_http_status(status: u16) {
    HTTP_REQUESTS
        .with_label_values(&[status.to_string().as_str()])
        .inc();
}

/// Encode all registered metrics in the Prometheus text format.
#[must_use]
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        render(),
    )
}

/// Router exposing `GET /metrics`.
pub fn router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Serve the metrics endpoint until the process exits.
///
/// Failing to bind is logged and does not affect token issuance.
pub async fn serve(addr: String) {
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "Could not open metrics port");
            return;
        }
    };

    info!(addr = %addr, "Metrics exporter listening");

    if let Err(e) = axum::serve(listener, router()).await {
        error!(error = %e, "Metrics exporter stopped");
    }
}
