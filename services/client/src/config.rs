//! services/client/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the analysis/insights backend.
    pub api_url: String,
    /// Base URL of the per-user document store; defaults to `api_url`.
    pub store_url: String,
    pub request_timeout_secs: u64,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Endpoint Settings ---
        let api_url = std::env::var("STUDY_COACH_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let store_url =
            std::env::var("STUDY_COACH_STORE_URL").unwrap_or_else(|_| api_url.clone());

        let timeout_str = std::env::var("STUDY_COACH_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string());
        let request_timeout_secs = timeout_str.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue(
                "STUDY_COACH_REQUEST_TIMEOUT_SECS".to_string(),
                e.to_string(),
            )
        })?;

        // --- Load Logging Settings ---
        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_url,
            store_url,
            request_timeout_secs,
            log_level,
        })
    }
}
