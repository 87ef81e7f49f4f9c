//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Primary environment variable holding the store connection URL.
pub const STORE_URL_VAR: &str = "CACHE_STORE_URL";

/// Fallback variable, kept for processes that already export a Redis URL.
pub const REDIS_URL_VAR: &str = "REDIS_URL";

/// Service configuration parameters.
///
/// Everything except the store URL has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection URL (`redis://`, `rediss://` or `memory://`)
    pub store_url: String,
    /// Namespace used when a request does not name one
    pub namespace: String,
    /// Default TTL in seconds applied by the gateway when none is given
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Sweeper interval in seconds (memory backend only)
    pub cleanup_interval: u64,
    /// Redis connect timeout
    pub connect_timeout: Duration,
    /// Redis per-command response timeout
    pub response_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STORE_URL` (or `REDIS_URL`) - Store connection URL, required
    /// - `CACHE_NAMESPACE` - Default namespace (default: app)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    /// - `REDIS_CONNECT_TIMEOUT_SECS` - Connect timeout (default: 5)
    /// - `REDIS_RESPONSE_TIMEOUT_SECS` - Response timeout (default: 2)
    ///
    /// # Errors
    /// Returns `CacheError::Config` when no store URL is set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_url = lookup(STORE_URL_VAR)
            .or_else(|| lookup(REDIS_URL_VAR))
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                CacheError::Config(format!(
                    "{} (or {}) must be set to a store URL",
                    STORE_URL_VAR, REDIS_URL_VAR
                ))
            })?;

        let defaults = Self::with_store_url(store_url);
        let parsed = |name: &str| lookup(name).and_then(|v| v.parse::<u64>().ok());

        Ok(Self {
            namespace: lookup("CACHE_NAMESPACE")
                .filter(|ns| !ns.is_empty())
                .unwrap_or(defaults.namespace.clone()),
            default_ttl: parsed("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: parsed("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            connect_timeout: parsed("REDIS_CONNECT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            response_timeout: parsed("REDIS_RESPONSE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.response_timeout),
            ..defaults
        })
    }

    /// Default configuration pointing at the given store.
    pub fn with_store_url(store_url: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            namespace: "app".to_string(),
            default_ttl: 3600,
            server_port: 3000,
            cleanup_interval: 1,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[(STORE_URL_VAR, "memory://")])).unwrap();
        assert_eq!(config.store_url, "memory://");
        assert_eq!(config.namespace, "app");
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_missing_url_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[("SERVER_PORT", "8080")]));
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_config_blank_url_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[(STORE_URL_VAR, "  ")]));
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_config_falls_back_to_redis_url() {
        let config =
            Config::from_lookup(lookup_from(&[(REDIS_URL_VAR, "redis://cache:6379")])).unwrap();
        assert_eq!(config.store_url, "redis://cache:6379");
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (STORE_URL_VAR, "memory://"),
            ("CACHE_NAMESPACE", "llm"),
            ("DEFAULT_TTL", "60"),
            ("SERVER_PORT", "8080"),
            ("REDIS_RESPONSE_TIMEOUT_SECS", "9"),
            ("CLEANUP_INTERVAL", "not-a-number"),
        ]))
        .unwrap();
        assert_eq!(config.namespace, "llm");
        assert_eq!(config.default_ttl, 60);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.response_timeout, Duration::from_secs(9));
        assert_eq!(config.cleanup_interval, 1);
    }
}
