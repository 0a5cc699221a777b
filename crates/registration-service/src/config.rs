//! Configuration for the registration service
//!
//! Values come from environment variables (and a `.env` file when present).
//! The defaults reproduce the stock deployment: port 3000, records under
//! `./data`, static assets under `./public`.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Default request body limit; face descriptor arrays are large
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding one JSON record per registered user
    pub data_dir: PathBuf,

    /// Root of the static front end
    pub public_dir: PathBuf,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Webhook that receives each saved record, if a device is attached
    pub device_webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            host: lookup("REGISTRATION_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("REGISTRATION_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("Invalid REGISTRATION_PORT")?,

            data_dir: lookup("DATA_DIR")
                .unwrap_or_else(|| "data".to_string())
                .into(),

            public_dir: lookup("PUBLIC_DIR")
                .unwrap_or_else(|| "public".to_string())
                .into(),

            max_body_bytes: match lookup("MAX_BODY_BYTES") {
                Some(v) => v.parse().context("Invalid MAX_BODY_BYTES")?,
                None => DEFAULT_MAX_BODY_BYTES,
            },

            device_webhook_url: lookup("DEVICE_WEBHOOK_URL").filter(|url| !url.is_empty()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("REGISTRATION_PORT must be greater than 0");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be greater than 0");
        }

        if let Some(url) = &self.device_webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("DEVICE_WEBHOOK_URL must be an http(s) URL: {}", url);
            }
        }

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Directory reserved for face-recognition model files
    pub fn models_dir(&self) -> PathBuf {
        self.public_dir.join("models")
    }

    /// Create the data and model directories. Runs once before the listener
    /// binds; an error here aborts startup.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;

        let models_dir = self.models_dir();
        std::fs::create_dir_all(&models_dir).with_context(|| {
            format!("Failed to create models directory: {}", models_dir.display())
        })?;

        Ok(())
    }
}
