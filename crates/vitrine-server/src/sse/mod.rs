//! Real-time display event push: wire encoding, connection registry,
//! fan-out, and stream lifecycle.

pub mod broadcast;
pub mod connection;
pub mod registry;
pub mod stream;
pub mod wire;

pub use broadcast::Broadcaster;
pub use connection::{EventSink, SseConnection, WriteError};
pub use registry::ConnectionRegistry;
