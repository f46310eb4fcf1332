//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Subscriber connections opened total (counter).
pub const SSE_CONNECTIONS_TOTAL: &str = "sse_connections_total";
/// Subscriber disconnections total (counter).
pub const SSE_DISCONNECTIONS_TOTAL: &str = "sse_disconnections_total";
/// Open subscriber connections (gauge).
pub const SSE_CONNECTIONS_ACTIVE: &str = "sse_connections_active";
/// Events delivered to subscriber queues total (counter).
pub const SSE_EVENTS_SENT_TOTAL: &str = "sse_events_sent_total";
/// Event deliveries that failed at the transport total (counter).
pub const SSE_SEND_FAILURES_TOTAL: &str = "sse_send_failures_total";

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
