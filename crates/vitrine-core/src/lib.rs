//! # vitrine-core
//!
//! Shared vocabulary for the Vitrine signage server.
//!
//! - **Branded IDs**: [`DisplayId`] and [`ConnectionId`] as newtypes so a
//!   display identifier can never be confused with a connection identifier
//! - **Display events**: reserved event names and the payload types carried
//!   on the wire (`display_updated`, the `connected` handshake, the global
//!   `adminUpdate` channel)

#![deny(unsafe_code)]

pub mod events;
pub mod ids;

pub use events::{
    DisplayAction, DisplayUpdate, EVENT_ADMIN_UPDATE, EVENT_CONNECTED, EVENT_DISPLAY_UPDATED,
    Handshake,
};
pub use ids::{ConnectionId, DisplayId};
