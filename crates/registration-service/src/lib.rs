//! Pill Dispenser Registration Service
//!
//! Accepts user registrations (name, age, medication schedule, face
//! descriptors) over HTTP, stores each as a JSON record for the dispenser and
//! serves the static registration front end.
//!
//! ## Endpoints
//!
//! - `POST /register` - Save a registration
//! - `GET /register/{identifier}` - Fetch a stored record
//! - `GET /health` - Health check
//! - `GET /*` - Static files from the public directory

pub mod config;
pub mod handlers;
pub mod notifier;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use config::Config;
pub use notifier::{DeviceNotification, DeviceNotifier, LogNotifier, WebhookNotifier};
pub use storage::RecordStore;

/// Application state shared across handlers
pub struct AppState {
    /// Record storage
    pub store: RecordStore,

    /// Receives every successfully saved record
    pub notifier: Arc<dyn DeviceNotifier>,

    /// Root of the static front end
    pub public_dir: PathBuf,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state with the default notifier and body limit
    pub fn new(data_dir: PathBuf, public_dir: PathBuf) -> Self {
        Self {
            store: RecordStore::new(data_dir),
            notifier: Arc::new(LogNotifier),
            public_dir,
            max_body_bytes: config::DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Create state from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let notifier: Arc<dyn DeviceNotifier> = match &config.device_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(LogNotifier),
        };

        Self::new(config.data_dir.clone(), config.public_dir.clone())
            .with_notifier(notifier)
            .with_max_body_bytes(config.max_body_bytes)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn DeviceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.public_dir);
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/register", post(handlers::register_handler))
        .route("/register/{identifier}", get(handlers::get_record_handler))
        // index.html and the rest of the front end
        .fallback_service(static_files)
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
