//! Sharing configuration.
//!
//! Dispatch and query settings for the orchestrator and gateway. Loaded from
//! environment variables with defaults suitable for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Settings for share orchestration and shared-access queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Maximum number of units in flight at once (1 dispatches sequentially).
    pub max_concurrency: usize,

    /// Per-unit deadline in milliseconds.
    ///
    /// Covers every attempt a port makes for one unit, so it should exceed
    /// the port's request timeout times its attempts plus backoff. The
    /// default leaves room for three 30 s engine attempts.
    pub unit_timeout_ms: u64,

    /// Whether listing operations accept a `limit` parameter.
    pub limit_supported: bool,

    /// Path prefix used when building links in API responses.
    pub api_base_path: String,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            unit_timeout_ms: 120_000,
            limit_supported: true,
            api_base_path: "/api/server/v1".to_string(),
        }
    }
}

impl SharingConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `USER_SHARING_MAX_CONCURRENCY`: Units in flight (default: 8)
    /// - `USER_SHARING_UNIT_TIMEOUT_MS`: Per-unit deadline (default: 120000)
    /// - `USER_SHARING_LIMIT_SUPPORTED`: Accept `limit` on listings (default: true)
    /// - `USER_SHARING_API_BASE_PATH`: Link prefix (default: /api/server/v1)
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if the loaded settings fail
    /// [`SharingConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        let config = Self {
            max_concurrency: std::env::var("USER_SHARING_MAX_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_concurrency),
            unit_timeout_ms: std::env::var("USER_SHARING_UNIT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.unit_timeout_ms),
            limit_supported: std::env::var("USER_SHARING_LIMIT_SUPPORTED")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.limit_supported),
            api_base_path: std::env::var("USER_SHARING_API_BASE_PATH")
                .unwrap_or(default.api_base_path),
        };

        config.validate()?;
        Ok(config)
    }

    /// Get the per-unit deadline as a Duration.
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_millis(self.unit_timeout_ms)
    }

    /// Reject settings that would stall dispatch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "USER_SHARING_MAX_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.unit_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "USER_SHARING_UNIT_TIMEOUT_MS".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SharingConfig::default();
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.unit_timeout(), Duration::from_secs(120));
        assert!(config.limit_supported);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = SharingConfig {
            max_concurrency: 0,
            ..SharingConfig::default()
        };
        assert!(config.validate().is_err());

        config.max_concurrency = 1;
        config.unit_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
