//! Server configuration.

use serde::{Deserialize, Serialize};
use vitrine_settings::VitrineSettings;

/// Runtime configuration for the Vitrine server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8080`, `0` for auto-assign).
    pub port: u16,
    /// Whether to attach a permissive CORS layer.
    pub cors: bool,
    /// Outbound frame queue capacity per subscriber connection.
    pub queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            cors: true,
            queue_capacity: 64,
        }
    }
}

impl From<&VitrineSettings> for ServerConfig {
    fn from(settings: &VitrineSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            cors: settings.server.cors,
            queue_capacity: settings.stream.queue_capacity.max(1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.cors);
        assert_eq!(cfg.queue_capacity, 64);
    }

    #[test]
    fn from_settings() {
        let mut settings = VitrineSettings::default();
        settings.server.host = "127.0.0.1".into();
        settings.server.port = 9191;
        settings.server.cors = false;
        settings.stream.queue_capacity = 256;

        let cfg = ServerConfig::from(&settings);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9191);
        assert!(!cfg.cors);
        assert_eq!(cfg.queue_capacity, 256);
    }

    #[test]
    fn zero_queue_capacity_is_clamped() {
        let mut settings = VitrineSettings::default();
        settings.stream.queue_capacity = 0;
        let cfg = ServerConfig::from(&settings);
        assert_eq!(cfg.queue_capacity, 1);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.queue_capacity, cfg.queue_capacity);
    }
}
