//! HTTP server configuration, derived from the environment.

use serde::Deserialize;

/// Configuration for the API server.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Address to bind the API server.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Request-rate limiting applied to every API route.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Maximum accepted request body, in bytes. Generous to accommodate
    /// inline attachment payloads.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Per-request timeout, in seconds. Must leave room for a bulk
    /// dispatch to settle against a slow server.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Fixed-window request-rate limit settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum requests allowed per client within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_listen_address() -> String {
    "0.0.0.0:3000".to_string()
}

const fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

const fn default_request_timeout_secs() -> u64 {
    120
}

const fn default_window_ms() -> u64 {
    15 * 60 * 1000
}

const fn default_max_requests() -> u32 {
    100
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            rate_limit: RateLimitConfig::default(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
        }
    }
}

impl HttpConfig {
    /// Build a configuration from the process environment.
    ///
    /// Recognised variables: `PORT`, `RATE_LIMIT_WINDOW_MS`, and
    /// `RATE_LIMIT_MAX_REQUESTS`. Unset or unparseable values fall back
    /// to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = env_parse::<u16>("PORT") {
            config.listen_address = format!("0.0.0.0:{port}");
        }
        if let Some(window_ms) = env_parse::<u64>("RATE_LIMIT_WINDOW_MS") {
            config.rate_limit.window_ms = window_ms;
        }
        if let Some(max_requests) = env_parse::<u32>("RATE_LIMIT_MAX_REQUESTS") {
            config.rate_limit.max_requests = max_requests;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(%name, %raw, "ignoring unparseable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = HttpConfig::default();
        assert_eq!(config.listen_address, "0.0.0.0:3000");
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
        assert_eq!(config.rate_limit.window_ms, 900_000);
        assert_eq!(config.rate_limit.max_requests, 100);
    }
}
