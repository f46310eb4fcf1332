//! Settings structs with compiled defaults.

use serde::{Deserialize, Serialize};

/// Top-level settings for the Vitrine server.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitrineSettings {
    /// Network and HTTP settings.
    pub server: ServerSettings,
    /// Push-stream settings.
    pub stream: StreamSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP port (0 for auto-assign).
    pub port: u16,
    /// Whether to attach a permissive CORS layer (admin UI runs on a
    /// different origin during development).
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors: true,
        }
    }
}

/// Push-stream settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Outbound frame queue capacity per connection. A subscriber whose
    /// queue is full has its frames dropped (there is no backpressure).
    pub queue_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`, or a
    /// full `tracing` env-filter directive).
    pub level: String,
    /// Emit JSON log lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
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
    fn default_server_settings() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8080);
        assert!(s.cors);
    }

    #[test]
    fn default_stream_settings() {
        let s = StreamSettings::default();
        assert_eq!(s.queue_capacity, 64);
    }

    #[test]
    fn default_logging_settings() {
        let s = LoggingSettings::default();
        assert_eq!(s.level, "info");
        assert!(!s.json);
    }

    #[test]
    fn serde_roundtrip() {
        let settings = VitrineSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: VitrineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, settings.server.port);
        assert_eq!(back.stream.queue_capacity, settings.stream.queue_capacity);
        assert_eq!(back.logging.level, settings.logging.level);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: VitrineSettings =
            serde_json::from_str(r#"{"server":{"port":9090}}"#).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.stream.queue_capacity, 64);
    }

    #[test]
    fn keys_are_camel_case() {
        let json = serde_json::to_value(VitrineSettings::default()).unwrap();
        assert!(json["stream"]["queueCapacity"].is_number());
        assert!(json["logging"]["level"].is_string());
    }
}
