//! Stream lifecycle — from accepted request to registry entry and back.
//!
//! The subscribe handler wires an inbound long-lived request into the
//! registry: register, push the `connected` handshake, then hand the frame
//! queue to the response body. Deregistration happens exactly once, when the
//! body stream is dropped — client disconnect, transport error, and server
//! teardown all end there.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderName};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::Stream;
use metrics::{counter, gauge};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vitrine_core::{DisplayId, EVENT_CONNECTED, Handshake};

use super::broadcast::Broadcaster;
use super::connection::{EventSink, SseConnection};
use super::registry::ConnectionRegistry;
use super::wire::send_event;
use crate::metrics::{
    SSE_CONNECTIONS_ACTIVE, SSE_CONNECTIONS_TOTAL, SSE_DISCONNECTIONS_TOTAL,
};
use crate::server::AppState;

/// `GET /api/displays/{display_id}/events` — open a push stream for one
/// display channel.
pub async fn events_handler(
    State(state): State<AppState>,
    Path(display_id): Path<String>,
) -> impl IntoResponse {
    let frames = subscribe(
        &state.broadcaster,
        DisplayId::from(display_id),
        state.queue_capacity,
    );
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            // Nginx would otherwise buffer the stream and defeat the push.
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(frames),
    )
}

/// Register a new subscriber connection for a display channel.
///
/// The returned stream yields encoded frames, starting with the `connected`
/// handshake, and deregisters the connection when dropped.
pub fn subscribe(
    broadcaster: &Broadcaster,
    display: DisplayId,
    queue_capacity: usize,
) -> EventFrames {
    let (tx, rx) = mpsc::channel(queue_capacity);
    let sink: Arc<dyn EventSink> = Arc::new(SseConnection::new(display.clone(), tx));

    broadcaster.registry().add_client(&display, sink.clone());
    counter!(SSE_CONNECTIONS_TOTAL).increment(1);
    gauge!(SSE_CONNECTIONS_ACTIVE).increment(1.0);
    let display_id = &display;
    info!(conn_id = sink.id(), display = %display_id, "display client connected");

    // Handshake goes straight onto this connection's queue, so it is the
    // first frame on the wire even if a dispatch lands concurrently.
    if let Err(e) = send_event(sink.as_ref(), EVENT_CONNECTED, &Handshake::new(display.clone())) {
        warn!(conn_id = sink.id(), error = %e, "failed to queue handshake event");
    }

    EventFrames {
        rx,
        _guard: Deregister {
            registry: broadcaster.registry().clone(),
            display,
            sink,
        },
    }
}

/// Encoded frames for one subscriber; deregisters on drop.
pub struct EventFrames {
    rx: mpsc::Receiver<Bytes>,
    _guard: Deregister,
}

impl Stream for EventFrames {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}

/// Removes the connection from the registry exactly once, whenever the
/// response body is dropped.
struct Deregister {
    registry: Arc<ConnectionRegistry>,
    display: DisplayId,
    sink: Arc<dyn EventSink>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.registry.remove_client(&self.display, &self.sink);
        counter!(SSE_DISCONNECTIONS_TOTAL).increment(1);
        gauge!(SSE_CONNECTIONS_ACTIVE).decrement(1.0);
        debug!(conn_id = self.sink.id(), display = %self.display, "display client disconnected");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
