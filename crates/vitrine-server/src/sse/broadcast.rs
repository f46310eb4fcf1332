//! Event fan-out to subscribed display clients.
//!
//! Two primitives: scoped delivery to one display channel, and broadcast to
//! every subscriber across every channel. Both isolate failures per
//! subscriber — a dead transport gets a warning, never a stop: the mutation
//! that triggered the notification must not fail because a signage client
//! went away mid-dispatch.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};
use vitrine_core::DisplayId;

use super::connection::EventSink;
use super::registry::ConnectionRegistry;
use super::wire::send_event;
use crate::metrics::{SSE_EVENTS_SENT_TOTAL, SSE_SEND_FAILURES_TOTAL};

/// Dispatches named events to registry subscribers.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send an event to every subscriber of one display channel.
    ///
    /// A channel with no subscribers is routine (a display that never
    /// connected) and a silent no-op. Dispatch only reads the registry —
    /// it never creates channel entries.
    pub fn send_to_display<P>(&self, display: &DisplayId, event: &str, payload: &P)
    where
        P: Serialize + ?Sized,
    {
        let subscribers = self.registry.connections(display);
        if subscribers.is_empty() {
            return;
        }
        let display_id = display;
        debug!(
            event,
            display = %display_id,
            recipients = subscribers.len(),
            "dispatching event to display"
        );
        for sink in &subscribers {
            Self::attempt(sink.as_ref(), event, payload);
        }
    }

    /// Send an event to every subscriber of every channel.
    pub fn broadcast_all<P>(&self, event: &str, payload: &P)
    where
        P: Serialize + ?Sized,
    {
        let snapshot = self.registry.snapshot();
        let recipients: usize = snapshot.values().map(Vec::len).sum();
        debug!(event, recipients, "broadcasting event to all displays");
        for subscribers in snapshot.values() {
            for sink in subscribers {
                Self::attempt(sink.as_ref(), event, payload);
            }
        }
    }

    /// One guarded delivery attempt. A failing write is logged and counted;
    /// it never propagates, so the loop always reaches the next subscriber.
    fn attempt<P>(sink: &dyn EventSink, event: &str, payload: &P)
    where
        P: Serialize + ?Sized,
    {
        match send_event(sink, event, payload) {
            Ok(()) => counter!(SSE_EVENTS_SENT_TOTAL).increment(1),
            Err(e) => {
                counter!(SSE_SEND_FAILURES_TOTAL).increment(1);
                warn!(conn_id = sink.id(), event, error = %e, "SSE delivery failed");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
