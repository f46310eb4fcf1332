//! # vitrine-server
//!
//! Axum HTTP server and real-time display event push for Vitrine.
//!
//! - SSE gateway: connection registry, wire encoding, scoped and global
//!   fan-out, stream lifecycle with drop-guard deregistration
//! - HTTP endpoints: health check, Prometheus metrics, the subscribe
//!   stream, and the notify surface consumed by CRUD services
//! - Graceful shutdown via `CancellationToken`; the registry is reset on
//!   teardown

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod sse;

pub use config::ServerConfig;
pub use server::{AppState, ServerError, VitrineServer};
pub use sse::{Broadcaster, ConnectionRegistry, EventSink, SseConnection, WriteError};
