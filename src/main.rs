//! Token Signal - HTTP entry point
//!
//! Loads configuration and the model bundle, then serves the API. A missing
//! or broken bundle is logged and leaves `/health` up with `model_loaded: false`.

use anyhow::{Context, Result};
use std::sync::Arc;
use token_signal::api::{create_router, AppState};
use token_signal::config::AppConfig;
use token_signal::ml_engine::{ModelArtifacts, TokenPredictor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    info!("🚀 Token Signal API v{}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config);

    let artifacts = match ModelArtifacts::load(&config.model.artifact_path) {
        Ok(artifacts) => Some(Arc::new(artifacts)),
        Err(e) => {
            warn!("❌ Model not loaded, predictions disabled: {}", e);
            None
        }
    };

    let state = AppState::new(
        TokenPredictor::new(artifacts),
        config.environment.clone(),
        config.verbose_errors(),
    );
    let app = create_router(state, config.api.cors_permissive);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("📍 Listening on {}", address);
    info!("🧪 Smoke test: GET /test");
    info!("❤️  Status: GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Shut down cleanly");
    Ok(())
}

/// JSON logs in production, human-readable elsewhere; `RUST_LOG` overrides
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("token_signal=info,tower_http=info"));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
