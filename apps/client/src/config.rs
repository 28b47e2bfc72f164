//! Environment-driven configuration, loaded once at startup.

use anyhow::{Context, Result};

use crate::sources::openfoodfacts::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the companion API service.
    pub backend_base_url: String,
    /// Base URL of the Open Food Facts instance to query.
    pub off_base_url: String,
    /// Per-request HTTP timeout, in seconds.
    pub http_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let http_timeout_secs = env_or("HTTP_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .context("HTTP_TIMEOUT_SECS must be a positive integer")?;

        Ok(Config {
            backend_base_url: env_or("BACKEND_BASE_URL", "http://localhost:3000"),
            off_base_url: env_or("OFF_BASE_URL", DEFAULT_BASE_URL),
            http_timeout_secs,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_to_default() {
        assert_eq!(env_or("GREENLABEL_TEST_UNSET_VAR", "fallback"), "fallback");
    }
}
