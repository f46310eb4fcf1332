//! # vitrined
//!
//! Vitrine server binary — loads settings, initializes logging, and runs
//! the HTTP/SSE server until SIGINT/SIGTERM.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vitrine_logging::LogFormat;
use vitrine_server::config::ServerConfig;
use vitrine_server::server::VitrineServer;

/// Vitrine signage server.
#[derive(Parser, Debug)]
#[command(name = "vitrined", about = "Vitrine signage server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (defaults to `~/.vitrine/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Disable the Prometheus `/metrics` endpoint.
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .settings
        .unwrap_or_else(vitrine_settings::settings_path);
    let settings = vitrine_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;

    let format = if settings.logging.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    vitrine_logging::init(&settings.logging.level, format)
        .context("failed to initialize logging")?;

    let mut config = ServerConfig::from(&settings);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let mut server = VitrineServer::new(config);
    if !args.no_metrics {
        server = server.with_metrics(vitrine_server::metrics::install_recorder());
    }

    let shutdown = server.shutdown().clone();
    drop(tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown signal received");
        shutdown.shutdown();
    }));

    server.serve().await.context("server exited with an error")?;
    Ok(())
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                let _ = sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["vitrined"]).unwrap();
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.settings.is_none());
        assert!(!cli.no_metrics);
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "vitrined",
            "--host",
            "127.0.0.1",
            "--port",
            "9191",
            "--no-metrics",
        ])
        .unwrap();
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9191));
        assert!(cli.no_metrics);
    }

    #[test]
    fn cli_settings_path() {
        let cli =
            Cli::try_parse_from(["vitrined", "--settings", "/tmp/custom.json"]).unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/custom.json")));
    }

    #[test]
    fn cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["vitrined", "--port", "notaport"]).is_err());
    }
}
