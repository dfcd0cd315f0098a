//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_ERROR_REQUEUE_SECS,
    DEFAULT_STATUS_UPDATE_RETRIES,
};

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment
/// variables, typically populated from a ConfigMap with `envFrom`.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Requeue delay after a retryable reconcile error, used when no
    /// per-resource backoff state exists yet (seconds)
    pub error_requeue_secs: u64,
    /// Minimum per-resource retry backoff (seconds)
    pub backoff_min_secs: u64,
    /// Maximum per-resource retry backoff (seconds)
    pub backoff_max_secs: u64,
    /// Bound on optimistic-concurrency status update retries
    pub status_update_retries: u32,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            error_requeue_secs: DEFAULT_ERROR_REQUEUE_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            status_update_retries: DEFAULT_STATUS_UPDATE_RETRIES,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            error_requeue_secs: env_or("ERROR_REQUEUE_SECS", DEFAULT_ERROR_REQUEUE_SECS),
            backoff_min_secs: env_or("BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max_secs: env_or("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            status_update_retries: env_or("STATUS_UPDATE_RETRIES", DEFAULT_STATUS_UPDATE_RETRIES),
            log_level: env_or_str("LOG_LEVEL", "info"),
            log_format: env_or_str("LOG_FORMAT", "text"),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_or_str(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let config = ControllerConfig::default();
        assert_eq!(config.error_requeue_secs, DEFAULT_ERROR_REQUEUE_SECS);
        assert_eq!(config.status_update_retries, DEFAULT_STATUS_UPDATE_RETRIES);
        assert_eq!(config.log_format, "text");
    }

    #[test]
    fn unparsable_env_falls_back_to_default() {
        std::env::set_var("BACKOFF_MIN_SECS", "not-a-number");
        let config = ControllerConfig::from_env();
        assert_eq!(config.backoff_min_secs, DEFAULT_BACKOFF_MIN_SECS);
        std::env::remove_var("BACKOFF_MIN_SECS");
    }
}
