//! Presentation Merge Service
//!
//! This service accepts presentation and PDF uploads over a web form,
//! converts non-PDF files to PDF through an external office-document
//! converter, and returns the page-order-preserving concatenation as a
//! single downloadable PDF.
//!
//! ## Architecture
//!
//! - **HTTP**: axum router (`GET /` form, `POST /` merge, `GET /healthz`)
//! - **Converter**: external `soffice --headless --convert-to pdf` process
//! - **Merge**: lopdf page concatenation
//! - **Telemetry**: OpenTelemetry OTLP export
//!
//! ## Configuration
//!
//! Environment variables:
//! - `BIND_ADDR`: listen address (default: 0.0.0.0:8080)
//! - `SOFFICE_PATH`: converter executable (default: soffice)
//! - `CONVERTIBLE_EXTENSIONS`: comma-separated allowlist (default: pptx,ppt,odp)
//! - `CONVERT_TIMEOUT_SECS`: per-file converter timeout (default: 120)
//! - `CONVERT_CONCURRENCY`: concurrent converter invocations (default: 1)
//! - `MAX_UPLOAD_BYTES`: multipart body limit (default: 100 MiB)
//! - `DOWNLOAD_FILENAME`: attachment name for the result (default: merged.pdf)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP collector endpoint
//! - `RUST_LOG`: Log level (default: info)

use anyhow::{Context, Result};
use deckmerge::config::Config;
use deckmerge::converter::SofficeConverter;
use deckmerge::pipeline::Pipeline;
use deckmerge::server::{self, AppState};
use deckmerge::telemetry;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize OpenTelemetry
    if let Err(e) = telemetry::init_telemetry() {
        warn!("Failed to initialize telemetry: {}", e);
    }

    info!("Starting presentation merge service");

    let config = Arc::new(Config::from_env());
    info!(
        "Configuration: bind_addr={}, soffice_path={}, extensions={:?}, concurrency={}",
        config.bind_addr,
        config.soffice_path.display(),
        config.convertible_extensions,
        config.convert_concurrency
    );

    let converter = Arc::new(SofficeConverter::new(
        config.soffice_path.clone(),
        config.convert_timeout,
    ));
    let pipeline = Arc::new(Pipeline::new(config.clone(), converter));
    let app = server::router(AppState {
        config: config.clone(),
        pipeline,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Merge service shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
