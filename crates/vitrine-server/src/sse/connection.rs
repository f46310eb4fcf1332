//! Subscriber connection handles.
//!
//! The registry never owns a transport. What it holds is an [`EventSink`] —
//! a non-owning handle that dispatch can push encoded frames to. The
//! concrete [`SseConnection`] wraps the send half of the frame queue feeding
//! one response-body task; the transport's lifetime belongs to the request
//! layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use vitrine_core::{ConnectionId, DisplayId};

/// Failure to hand a frame to a subscriber's transport.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum WriteError {
    /// The subscriber's frame queue is full (stalled consumer).
    #[error("subscriber frame queue is full")]
    QueueFull,
    /// The transport side of the queue is gone (client disconnected).
    #[error("subscriber transport is closed")]
    Closed,
}

/// A target that dispatch can attempt to push one encoded frame to.
///
/// This is the seam between fan-out and transport: the dispatcher only ever
/// sees `Arc<dyn EventSink>`, so tests can stand in failing or non-stream
/// sinks, and the capability check on a sink that is not an event stream
/// stays an observable code path rather than a static impossibility.
pub trait EventSink: Send + Sync {
    /// Connection identity, for diagnostics.
    fn id(&self) -> &str;

    /// Whether the underlying object is an open event-stream transport.
    /// Anything else cannot accept server-push writes.
    fn is_event_stream(&self) -> bool;

    /// Queue one encoded frame for delivery. Non-blocking; never awaits.
    fn write_frame(&self, frame: Bytes) -> Result<(), WriteError>;
}

/// One open SSE connection for a display channel.
pub struct SseConnection {
    /// Unique connection ID.
    id: ConnectionId,
    /// The channel this connection subscribed to.
    display_id: DisplayId,
    /// Send half of the frame queue; the response body drains the other half.
    tx: mpsc::Sender<Bytes>,
    /// When this connection was established.
    connected_at: Instant,
    /// Frames dropped because the queue was full or closed.
    dropped_frames: AtomicU64,
}

impl SseConnection {
    /// Create a connection handle around a frame queue sender.
    pub fn new(display_id: DisplayId, tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            id: ConnectionId::new(),
            display_id,
            tx,
            connected_at: Instant::now(),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// The display channel this connection belongs to.
    pub fn display_id(&self) -> &DisplayId {
        &self.display_id
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl EventSink for SseConnection {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn is_event_stream(&self) -> bool {
        true
    }

    fn write_frame(&self, frame: Bytes) -> Result<(), WriteError> {
        self.tx.try_send(frame).map_err(|e| {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            match e {
                mpsc::error::TrySendError::Full(_) => WriteError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => WriteError::Closed,
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
