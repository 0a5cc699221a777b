//! Pill Dispenser Registration Service
//!
//! HTTP entry point: registration endpoint plus the static front end

use anyhow::{Context, Result};
use registration_service::{create_router, AppState, Config};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registration_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Registration Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Directories must exist before any request is accepted
    config
        .ensure_directories()
        .context("Failed to create directories")?;
    info!("Data directory: {}", config.data_dir.display());
    info!("Public directory: {}", config.public_dir.display());
    match &config.device_webhook_url {
        Some(url) => info!("Device webhook: {}", url),
        None => info!("No device webhook configured, records are only saved locally"),
    }

    // Create application state
    let state = AppState::from_config(&config);

    // Create router
    let app = create_router(state);

    // Bind and serve
    let listener = TcpListener::bind(&config.address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.address()))?;

    info!("Web server running at http://{}", config.address());
    info!("Pill dispenser registration app ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Registration Service stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
}
