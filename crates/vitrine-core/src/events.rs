//! Reserved event names and wire payload types.
//!
//! Three event names are reserved by the surrounding system:
//!
//! - [`EVENT_CONNECTED`]: handshake sent once, immediately after a stream
//!   is registered, so the client can confirm the channel is live
//! - [`EVENT_DISPLAY_UPDATED`]: scoped notification that a display or one
//!   of its widgets changed; payload carries at least `displayId` + `action`
//! - [`EVENT_ADMIN_UPDATE`]: the fixed name for global broadcasts to every
//!   connected subscriber; payload is arbitrary JSON
//!
//! Payloads are transient — encoded, pushed, and forgotten. Nothing here is
//! persisted or replayed for late subscribers.

use serde::{Deserialize, Serialize};

use crate::ids::DisplayId;

/// Handshake event name, sent on stream open.
pub const EVENT_CONNECTED: &str = "connected";

/// Scoped display-change event name.
pub const EVENT_DISPLAY_UPDATED: &str = "display_updated";

/// Global broadcast event name. The camelCase form is the wire contract
/// the admin dashboard listens on.
pub const EVENT_ADMIN_UPDATE: &str = "adminUpdate";

/// What happened to a display (or its widgets) to trigger a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayAction {
    /// A display was created.
    Create,
    /// A display or one of its widgets was updated.
    Update,
    /// A display was deleted.
    Delete,
}

impl DisplayAction {
    /// Wire-format string for this action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Payload of a `display_updated` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayUpdate {
    /// The display whose data changed.
    pub display_id: DisplayId,
    /// What changed.
    pub action: DisplayAction,
}

impl DisplayUpdate {
    /// Build a `display_updated` payload.
    #[must_use]
    pub fn new(display_id: impl Into<DisplayId>, action: DisplayAction) -> Self {
        Self {
            display_id: display_id.into(),
            action,
        }
    }
}

/// Payload of the `connected` handshake event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// The channel the stream is now subscribed to.
    pub display_id: DisplayId,
}

impl Handshake {
    /// Build a handshake payload for one display channel.
    #[must_use]
    pub fn new(display_id: impl Into<DisplayId>) -> Self {
        Self {
            display_id: display_id.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
