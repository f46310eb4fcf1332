//! Connection registry — which subscriber connections belong to which
//! display channel.
//!
//! Pure bookkeeping: the registry owns no transports, only `Arc` handles.
//! One lock guards the whole map so mutation and enumeration serialize; a
//! channel key exists exactly as long as it has at least one subscriber.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use vitrine_core::DisplayId;

use super::connection::EventSink;

/// In-memory map of display channel → live subscriber connections.
///
/// Constructed explicitly and shared via `Arc` — there is deliberately no
/// process-wide instance, so tests and shards each get their own isolated
/// registry.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: RwLock<HashMap<DisplayId, Vec<Arc<dyn EventSink>>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection under a display channel.
    ///
    /// The channel's collection is created on first subscriber. No
    /// deduplication: registering the same connection twice delivers every
    /// event twice. Callers register exactly once per physical connection.
    pub fn add_client(&self, display: &DisplayId, sink: Arc<dyn EventSink>) {
        let mut channels = self.channels.write();
        let subscribers = channels.entry(display.clone()).or_default();
        subscribers.push(sink);
        let display_id = display;
        debug!(display = %display_id, subscribers = subscribers.len(), "subscriber registered");
    }

    /// Remove a connection from a display channel.
    ///
    /// Matches by pointer identity and removes the first occurrence. The
    /// channel entry is deleted the instant its collection empties. Removing
    /// an absent connection, or from an unknown channel, is a silent no-op —
    /// disconnect paths may race and double-removal must stay safe.
    pub fn remove_client(&self, display: &DisplayId, sink: &Arc<dyn EventSink>) {
        let mut channels = self.channels.write();
        let Some(subscribers) = channels.get_mut(display) else {
            return;
        };
        let Some(pos) = subscribers.iter().position(|s| Arc::ptr_eq(s, sink)) else {
            return;
        };
        let _ = subscribers.remove(pos);
        if subscribers.is_empty() {
            let _ = channels.remove(display);
        }
        let display_id = display;
        debug!(display = %display_id, "subscriber removed");
    }

    /// Snapshot of one channel's subscribers (empty if unknown).
    pub fn connections(&self, display: &DisplayId) -> Vec<Arc<dyn EventSink>> {
        self.channels
            .read()
            .get(display)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of the channel identities that currently have subscribers.
    pub fn channels(&self) -> Vec<DisplayId> {
        self.channels.read().keys().cloned().collect()
    }

    /// Snapshot of the whole registry.
    pub fn snapshot(&self) -> HashMap<DisplayId, Vec<Arc<dyn EventSink>>> {
        self.channels.read().clone()
    }

    /// Number of channels with at least one subscriber.
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Total subscriber connections across all channels.
    pub fn connection_count(&self) -> usize {
        self.channels.read().values().map(Vec::len).sum()
    }

    /// Clear the entire registry.
    ///
    /// For test harnesses and graceful shutdown, not steady-state control
    /// flow. Dropping the handles here does not close transports — their
    /// owners observe closure through their own queues.
    pub fn reset(&self) {
        self.channels.write().clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
