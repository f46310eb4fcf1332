//! `VitrineServer` — Axum HTTP server and event fan-out wiring.
//!
//! The CRUD services that own displays and widgets live elsewhere; what they
//! need from this process is the notify surface: one scoped endpoint per
//! display channel and one global broadcast endpoint, both fire-and-forget.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use vitrine_core::{DisplayAction, DisplayId, DisplayUpdate, EVENT_ADMIN_UPDATE, EVENT_DISPLAY_UPDATED};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics;
use crate::shutdown::ShutdownCoordinator;
use crate::sse::Broadcaster;
use crate::sse::registry::ConnectionRegistry;
use crate::sse::stream::events_handler;

/// Errors from running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event fan-out over the connection registry.
    pub broadcaster: Broadcaster,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Frame queue capacity for new subscriber connections.
    pub queue_capacity: usize,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The main Vitrine server.
pub struct VitrineServer {
    config: ServerConfig,
    broadcaster: Broadcaster,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl VitrineServer {
    /// Create a new server with a fresh connection registry.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            broadcaster: Broadcaster::new(Arc::new(ConnectionRegistry::new())),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            broadcaster: self.broadcaster.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            queue_capacity: self.config.queue_capacity,
            metrics: self.metrics.clone(),
        };

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/api/displays/{display_id}/events", get(events_handler))
            .route("/api/displays/{display_id}/notify", post(notify_handler))
            .route("/api/broadcast", post(broadcast_handler))
            .layer(TraceLayer::new_for_http());

        let router = if self.config.cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        router.with_state(state)
    }

    /// Bind and run until shutdown is triggered, then reset the registry.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener.local_addr().map_err(ServerError::Serve)?;
        info!(addr = %local, "vitrine server listening");

        let shutdown = self.shutdown.clone();
        let registry = self.broadcaster.registry().clone();
        let router = self.router();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        registry.reset();
        info!("vitrine server stopped");
        Ok(())
    }

    /// Get the broadcaster (for in-process collaborators).
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Body of a scoped notify request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifyRequest {
    /// Event name (defaults to `display_updated`).
    pub event: Option<String>,
    /// Action recorded in the default payload (defaults to `update`).
    pub action: Option<DisplayAction>,
    /// Explicit payload; replaces the default `{displayId, action}` body.
    pub payload: Option<Value>,
}

/// Body of a global broadcast request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    /// Payload delivered to every subscriber under `adminUpdate`.
    pub payload: Value,
}

/// Outcome of a notify or broadcast request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    /// The event name that was dispatched.
    pub event: String,
    /// Subscribers present at dispatch time. Delivery is fire-and-forget;
    /// this is a count of attempts, not acknowledgements.
    pub recipients: usize,
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.broadcaster.registry();
    let resp = health::health_check(
        state.start_time,
        registry.connection_count(),
        registry.channel_count(),
    );
    Json(resp)
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => metrics::render(&handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /api/displays/{display_id}/notify
async fn notify_handler(
    State(state): State<AppState>,
    Path(display_id): Path<String>,
    Json(req): Json<NotifyRequest>,
) -> Json<DispatchResponse> {
    let display = DisplayId::from(display_id);
    let event = req.event.as_deref().unwrap_or(EVENT_DISPLAY_UPDATED);
    let recipients = state.broadcaster.registry().connections(&display).len();

    match req.payload {
        Some(payload) => state.broadcaster.send_to_display(&display, event, &payload),
        None => {
            let payload =
                DisplayUpdate::new(display.clone(), req.action.unwrap_or(DisplayAction::Update));
            state.broadcaster.send_to_display(&display, event, &payload);
        }
    }

    Json(DispatchResponse {
        event: event.to_string(),
        recipients,
    })
}

/// POST /api/broadcast
async fn broadcast_handler(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Json<DispatchResponse> {
    let recipients = state.broadcaster.registry().connection_count();
    state
        .broadcaster
        .broadcast_all(EVENT_ADMIN_UPDATE, &req.payload);
    Json(DispatchResponse {
        event: EVENT_ADMIN_UPDATE.to_string(),
        recipients,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use futures::StreamExt;
    use tower::ServiceExt;

    use crate::sse::stream::subscribe;

    fn make_server() -> VitrineServer {
        VitrineServer::new(ServerConfig {
            port: 0,
            ..ServerConfig::default()
        })
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = axum::body::to_bytes(body, 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_body()).await;
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 0);
        assert_eq!(parsed["displays"], 0);
    }

    #[tokio::test]
    async fn health_counts_live_connections() {
        let server = make_server();
        let _frames = subscribe(server.broadcaster(), DisplayId::from("d1"), 8);
        let app = server.router();

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let parsed = body_json(resp.into_body()).await;
        assert_eq!(parsed["connections"], 1);
        assert_eq!(parsed["displays"], 1);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn events_endpoint_streams_handshake() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .uri("/api/displays/d1/events")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-cache");

        let mut body = resp.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(
            &first[..],
            b"event: connected\ndata: {\"displayId\":\"d1\"}\n\n"
        );
    }

    #[tokio::test]
    async fn notify_with_no_subscribers_reports_zero() {
        let server = make_server();
        let app = server.router();

        let req = Request::builder()
            .method("POST")
            .uri("/api/displays/d1/notify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_body()).await;
        assert_eq!(parsed["event"], "display_updated");
        assert_eq!(parsed["recipients"], 0);
    }

    #[tokio::test]
    async fn notify_delivers_default_payload() {
        let server = make_server();
        let mut frames = subscribe(server.broadcaster(), DisplayId::from("d1"), 8);
        let app = server.router();

        let req = Request::builder()
            .method("POST")
            .uri("/api/displays/d1/notify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"action":"delete"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let parsed = body_json(resp.into_body()).await;
        assert_eq!(parsed["recipients"], 1);

        // Handshake first, then the notification.
        let _ = frames.next().await;
        let frame = frames.next().await.unwrap().unwrap();
        assert_eq!(
            &frame[..],
            b"event: display_updated\ndata: {\"displayId\":\"d1\",\"action\":\"delete\"}\n\n"
        );
    }

    #[tokio::test]
    async fn notify_with_explicit_payload_passes_it_through() {
        let server = make_server();
        let mut frames = subscribe(server.broadcaster(), DisplayId::from("d1"), 8);
        let app = server.router();

        let req = Request::builder()
            .method("POST")
            .uri("/api/displays/d1/notify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"event":"widget_refresh","payload":{"widgetId":"w9"}}"#,
            ))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let parsed = body_json(resp.into_body()).await;
        assert_eq!(parsed["event"], "widget_refresh");

        let _ = frames.next().await;
        let frame = frames.next().await.unwrap().unwrap();
        assert_eq!(
            &frame[..],
            b"event: widget_refresh\ndata: {\"widgetId\":\"w9\"}\n\n"
        );
    }

    #[tokio::test]
    async fn notify_does_not_leak_to_other_displays() {
        let server = make_server();
        let mut d1 = subscribe(server.broadcaster(), DisplayId::from("d1"), 8);
        let mut d2 = subscribe(server.broadcaster(), DisplayId::from("d2"), 8);
        let app = server.router();

        let req = Request::builder()
            .method("POST")
            .uri("/api/displays/d1/notify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let _ = app.oneshot(req).await.unwrap();

        let _ = d1.next().await; // handshake
        assert!(d1.next().await.is_some());

        let _ = d2.next().await; // handshake
        assert!(futures::poll!(std::pin::pin!(d2.next())).is_pending());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_display() {
        let server = make_server();
        let mut d1 = subscribe(server.broadcaster(), DisplayId::from("d1"), 8);
        let mut d2 = subscribe(server.broadcaster(), DisplayId::from("d2"), 8);
        let app = server.router();

        let req = Request::builder()
            .method("POST")
            .uri("/api/broadcast")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"payload":{"msg":"maintenance at noon"}}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let parsed = body_json(resp.into_body()).await;
        assert_eq!(parsed["event"], "adminUpdate");
        assert_eq!(parsed["recipients"], 2);

        for frames in [&mut d1, &mut d2] {
            let _ = frames.next().await; // handshake
            let frame = frames.next().await.unwrap().unwrap();
            assert_eq!(
                &frame[..],
                b"event: adminUpdate\ndata: {\"msg\":\"maintenance at noon\"}\n\n"
            );
        }
    }

    #[tokio::test]
    async fn server_accessors() {
        let server = make_server();
        assert_eq!(server.config().host, "0.0.0.0");
        assert!(!server.shutdown().is_shutting_down());
        assert_eq!(server.broadcaster().registry().connection_count(), 0);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let server = make_server();
        let shutdown = server.shutdown().clone();

        let handle = tokio::spawn(server.serve());
        // Give the listener a moment to bind, then trigger shutdown.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("serve should stop after shutdown")
            .unwrap();
        assert!(result.is_ok());
    }
}
