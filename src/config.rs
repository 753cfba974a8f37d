//! Configuration Module
//!
//! Handles loading server, cache and rate limiter settings from environment
//! variables, with optional route tables read from a JSON file.

use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::cache::CacheRouteRule;
use crate::error::{GuardError, Result};
use crate::ratelimit::RateLimitRule;

/// Server configuration parameters.
///
/// All scalar values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of cached responses
    pub cache_max_entries: usize,
    /// TTL in milliseconds for routes without an explicit rule
    pub cache_default_ttl_ms: u64,
    /// Largest response body the cache will buffer
    pub cache_max_body_bytes: usize,
    /// Length of one rate limiting window in milliseconds
    pub rate_limit_window_ms: u64,
    /// Request limit for routes without an explicit rule
    pub rate_limit_default: u32,
    /// Interval in seconds between background sweeps of both stores
    pub sweep_interval_secs: u64,
    /// Take the client address from `X-Forwarded-For` when present
    pub trust_forwarded_for: bool,
    /// Ordered cache policy table, first matching prefix wins
    pub cache_routes: Vec<CacheRouteRule>,
    /// Rate limit pattern table
    pub rate_limit_routes: Vec<RateLimitRule>,
}

/// Route tables as they appear in a `ROUTE_POLICY_FILE`.
#[derive(Debug, Default, Deserialize)]
struct RoutePolicyFile {
    #[serde(default)]
    cache_routes: Option<Vec<CacheRouteRule>>,
    #[serde(default)]
    rate_limit_routes: Option<Vec<RateLimitRule>>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_MAX_ENTRIES` - Maximum cached responses (default: 500)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 120000)
    /// - `CACHE_MAX_BODY_BYTES` - Largest cacheable body (default: 1 MiB)
    /// - `RATE_LIMIT_WINDOW_MS` - Window length in milliseconds (default: 60000)
    /// - `RATE_LIMIT_DEFAULT` - Default requests per window (default: 100)
    /// - `SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    /// - `TRUST_FORWARDED_FOR` - Honour `X-Forwarded-For` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.cache_default_ttl_ms),
            cache_max_body_bytes: env_or("CACHE_MAX_BODY_BYTES", defaults.cache_max_body_bytes),
            rate_limit_window_ms: env_or("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            rate_limit_default: env_or("RATE_LIMIT_DEFAULT", defaults.rate_limit_default),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            trust_forwarded_for: env_or("TRUST_FORWARDED_FOR", defaults.trust_forwarded_for),
            ..defaults
        }
    }

    /// Loads the environment configuration and, when `ROUTE_POLICY_FILE` is
    /// set, replaces the route tables with the ones from that file.
    pub fn load() -> Result<Self> {
        let config = Self::from_env();
        match env::var("ROUTE_POLICY_FILE") {
            Ok(path) if !path.is_empty() => config.with_route_file(path),
            _ => Ok(config),
        }
    }

    /// Replaces the route tables present in the given JSON file.
    ///
    /// Tables missing from the file keep their current value.
    pub fn with_route_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GuardError::Config(format!("{}: {}", path.display(), e)))?;
        let file: RoutePolicyFile = serde_json::from_str(&raw)
            .map_err(|e| GuardError::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(cache_routes) = file.cache_routes {
            self.cache_routes = cache_routes;
        }
        if let Some(rate_limit_routes) = file.rate_limit_routes {
            self.rate_limit_routes = rate_limit_routes;
        }
        Ok(self)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_max_entries: 500,
            cache_default_ttl_ms: 120_000,
            cache_max_body_bytes: 1024 * 1024,
            rate_limit_window_ms: 60_000,
            rate_limit_default: 100,
            sweep_interval_secs: 60,
            trust_forwarded_for: false,
            cache_routes: vec![
                CacheRouteRule::skip("/admin"),
                CacheRouteRule::skip("/health"),
                CacheRouteRule::ttl("/items", 60_000),
                CacheRouteRule::ttl("/dashboard", 30_000),
                CacheRouteRule::ttl("/settings", 300_000),
            ],
            rate_limit_routes: vec![
                RateLimitRule::new("/auth/login", 5),
                RateLimitRule::new("POST:/items", 30),
                RateLimitRule::new("/admin", 20),
            ],
        }
    }
}
