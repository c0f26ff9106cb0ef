//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The value is built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one file per cache record
    pub store_root: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL every inbound path is appended to
    pub upstream_url: String,
    /// Record lifetime in seconds
    pub cache_ttl: u64,
    /// Background sweep interval in seconds (0 disables the sweep)
    pub sweep_interval: u64,
    /// Upstream request timeout in seconds (0 waits indefinitely)
    pub upstream_timeout: u64,
    /// Append the inbound query string to the upstream URL
    pub forward_query: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ROOT` - Cache directory (default: ./cache)
    /// - `SERVER_PORT` - HTTP server port (default: 80)
    /// - `UPSTREAM_URL` - Upstream base URL (default: https://bitcoinexplorer.org/api)
    /// - `CACHE_TTL` - Record lifetime in seconds (default: 3600)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds, 0 disables (default: 300)
    /// - `UPSTREAM_TIMEOUT` - Upstream timeout in seconds, 0 disables (default: 0)
    /// - `FORWARD_QUERY` - Forward query strings upstream (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_root: env::var("CACHE_ROOT")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_root),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.upstream_url),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            upstream_timeout: parse_var("UPSTREAM_TIMEOUT").unwrap_or(defaults.upstream_timeout),
            forward_query: parse_var("FORWARD_QUERY").unwrap_or(defaults.forward_query),
        }
    }

    /// Record lifetime as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Upstream timeout, if one is configured.
    pub fn upstream_timeout(&self) -> Option<Duration> {
        (self.upstream_timeout > 0).then(|| Duration::from_secs(self.upstream_timeout))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("./cache"),
            server_port: 80,
            upstream_url: "https://bitcoinexplorer.org/api".to_string(),
            cache_ttl: 3600,
            sweep_interval: 300,
            upstream_timeout: 0,
            forward_query: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.store_root, PathBuf::from("./cache"));
        assert_eq!(config.server_port, 80);
        assert_eq!(config.upstream_url, "https://bitcoinexplorer.org/api");
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.sweep_interval, 300);
        assert!(!config.forward_query);
    }

    #[test]
    fn test_ttl_is_one_hour_by_default() {
        assert_eq!(Config::default().ttl().as_millis(), 3_600_000);
    }

    #[test]
    fn test_upstream_timeout_zero_disables() {
        let mut config = Config::default();
        assert!(config.upstream_timeout().is_none());

        config.upstream_timeout = 5;
        assert_eq!(config.upstream_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_ROOT");
        env::remove_var("SERVER_PORT");
        env::remove_var("UPSTREAM_URL");
        env::remove_var("CACHE_TTL");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("UPSTREAM_TIMEOUT");
        env::remove_var("FORWARD_QUERY");

        let config = Config::from_env();
        assert_eq!(config.store_root, PathBuf::from("./cache"));
        assert_eq!(config.server_port, 80);
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.sweep_interval, 300);
        assert_eq!(config.upstream_timeout, 0);
        assert!(!config.forward_query);
    }
}
