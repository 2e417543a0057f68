//! Propagation engine configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Connection settings for the propagation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine endpoint.
    pub endpoint: EngineEndpoint,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum attempts per request, including the first.
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: EngineEndpoint {
                base_url: "http://localhost:9443".to_string(),
                api_key: None,
            },
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SHARING_ENGINE_URL`: Engine base URL (default: http://localhost:9443)
    /// - `SHARING_ENGINE_API_KEY`: Engine API key
    /// - `SHARING_ENGINE_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `SHARING_ENGINE_MAX_RETRIES`: Maximum attempts per request (default: 3)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: EngineEndpoint {
                base_url: std::env::var("SHARING_ENGINE_URL")
                    .unwrap_or(default.endpoint.base_url),
                api_key: std::env::var("SHARING_ENGINE_API_KEY").ok(),
            },
            timeout_secs: std::env::var("SHARING_ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("SHARING_ENGINE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff policy for engine requests.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries.max(1),
            ..RetryConfig::default()
        }
    }

    /// Validate that the configuration is usable outside development.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.endpoint.api_key.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "SHARING_ENGINE_API_KEY".to_string(),
            ));
        }
        if !self.endpoint.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "SHARING_ENGINE_URL".to_string(),
                message: "must use https".to_string(),
            });
        }
        Ok(())
    }
}

/// Base URL and credentials of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEndpoint {
    /// Base URL (e.g., "https://sharing.internal:9443").
    pub base_url: String,

    /// API key for service-to-service authentication.
    pub api_key: Option<String>,
}

impl EngineEndpoint {
    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check if API key authentication is available.
    pub fn has_auth(&self) -> bool {
        self.api_key.is_some()
    }
}
