//! The SSE wire contract.
//!
//! One event is exactly:
//!
//! ```text
//! event: <name>\n
//! data: <compact json payload>\n
//! \n
//! ```
//!
//! [`encode`] produces that frame as a single buffer; whether a transport
//! writes it in one piece or several is a batching choice, never a protocol
//! variant. [`send_event`] wraps the encode with the capability gate and the
//! serialization guard, so a delivery attempt can only fail with a transport
//! [`WriteError`] — everything else is reported as a diagnostic and dropped.

use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

use super::connection::{EventSink, WriteError};

/// Diagnostic emitted when a push is attempted on a sink that is not an
/// open event-stream transport. Fixed text; the admin log greps for it.
pub const NON_SSE_SINK_DIAGNOSTIC: &str =
    "Attempted to send SSE event on a non-SSE response object.";

/// Whether a name is safe to place on an `event:` line.
///
/// A name containing CR or LF would terminate the line early and corrupt
/// the framing of every following field; an empty name is meaningless to
/// `EventSource` listeners.
pub fn is_valid_event_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['\n', '\r'])
}

/// Encode one event as its exact wire bytes.
pub fn encode<P>(event: &str, payload: &P) -> Result<Bytes, serde_json::Error>
where
    P: Serialize + ?Sized,
{
    let json = serde_json::to_string(payload)?;
    Ok(Bytes::from(format!("event: {event}\ndata: {json}\n\n")))
}

/// Attempt one event delivery to one sink.
///
/// Returns `Ok(())` without writing any bytes when:
/// - the sink is not an event stream (fixed diagnostic, see
///   [`NON_SSE_SINK_DIAGNOSTIC`])
/// - the event name would corrupt the framing
/// - the payload fails to serialize
///
/// A transport write failure propagates — failure isolation across
/// subscribers belongs to the dispatcher, not here.
pub fn send_event<P>(sink: &dyn EventSink, event: &str, payload: &P) -> Result<(), WriteError>
where
    P: Serialize + ?Sized,
{
    if !sink.is_event_stream() {
        warn!(conn_id = sink.id(), "{NON_SSE_SINK_DIAGNOSTIC}");
        return Ok(());
    }
    if !is_valid_event_name(event) {
        warn!(conn_id = sink.id(), event, "rejecting unsafe SSE event name");
        return Ok(());
    }
    let frame = match encode(event, payload) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(conn_id = sink.id(), event, error = %e, "failed to serialize event payload");
            return Ok(());
        }
    };
    sink.write_frame(frame)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
