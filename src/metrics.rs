use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref CHAT_REQUESTS: Counter =
        register_counter!("gateway_chat_requests_total", "Total number of chat requests").unwrap();
    pub static ref RATE_LIMITED: Counter = register_counter!(
        "gateway_rate_limited_total",
        "Chat requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref UPSTREAM_FAILURES: Counter = register_counter!(
        "gateway_upstream_failures_total",
        "Relay calls that failed or timed out"
    )
    .unwrap();
    pub static ref SPA_FALLBACKS: Counter = register_counter!(
        "gateway_spa_fallbacks_total",
        "Static requests answered with the root document"
    )
    .unwrap();
    pub static ref RELAY_LATENCY: Histogram = register_histogram!(
        "gateway_relay_latency_seconds",
        "Upstream chat completion latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_CLIENTS: Gauge = register_gauge!(
        "gateway_rate_limit_clients",
        "Client identifiers tracked by the rate limiter"
    )
    .unwrap();
}

/// Render every registered metric in the prometheus text format.
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("metrics encoding failed: {e}"))?;
    String::from_utf8(buffer).map_err(|e| format!("metrics are not utf-8: {e}"))
}
