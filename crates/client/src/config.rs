//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SANDPIPER_API_URL` - Base URL of the remote storefront API
//!
//! ## Optional
//! - `SANDPIPER_DATA_DIR` - Directory for persisted state (default: `.sandpiper`)
//! - `SANDPIPER_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".sandpiper";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote storefront API.
    pub api_base_url: Url,
    /// Directory holding persisted credential and cart state.
    pub data_dir: PathBuf,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a configuration directly, using the default request timeout.
    #[must_use]
    pub fn new(api_base_url: Url, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url,
            data_dir: data_dir.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("SANDPIPER_API_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SANDPIPER_API_URL".to_string(), e.to_string())
            })?;
        let data_dir = PathBuf::from(get_env_or_default("SANDPIPER_DATA_DIR", DEFAULT_DATA_DIR));
        let request_timeout = Duration::from_secs(
            get_env_or_default(
                "SANDPIPER_REQUEST_TIMEOUT_SECS",
                &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "SANDPIPER_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?,
        );

        Ok(Self {
            api_base_url,
            data_dir,
            request_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_default_timeout() {
        let url = Url::parse("http://localhost:4000").expect("url");
        let config = ClientConfig::new(url, "/tmp/sandpiper-test");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/sandpiper-test"));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = "not a url".parse::<Url>();
        assert!(result.is_err());
    }
}
