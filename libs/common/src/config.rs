//! Configuration shared by the access library and the API service
//!
//! Values come from an optional configuration file (path taken from
//! `SCHOOL_ACCESS_CONFIG`) overlaid with `SCHOOL_ACCESS_*` environment
//! variables. Every field has a default, so an empty environment yields a
//! usable local setup.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Prefix of the environment variables read by [`AccessConfig::from_env`]
pub const ENV_PREFIX: &str = "SCHOOL_ACCESS";

/// Environment variable holding the optional configuration file path
pub const CONFIG_PATH_VAR: &str = "SCHOOL_ACCESS_CONFIG";

/// Access layer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Base URL of the permissions / staff directory backend
    pub permissions_api_url: String,
    /// Bearer token sent by the HTTP directory client
    pub api_token: Option<String>,
    /// Timeout applied to every backend request, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Retries after the first failed fetch
    pub max_retries: u32,
    /// First backoff delay, doubled on every retry
    pub retry_base_delay_ms: u64,
    /// Upper bound of the backoff delay
    pub retry_max_delay_ms: u64,
    /// Artificial round trip added by the in-memory directory
    pub simulated_latency_ms: u64,
    /// Address the API service listens on
    pub bind_address: String,
    /// Shared secret for HS256 access tokens
    pub jwt_secret: Option<String>,
    /// RS256 public key (PEM or path to a PEM file), preferred over the secret
    pub jwt_public_key: Option<String>,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            permissions_api_url: "http://localhost:3001".to_string(),
            api_token: None,
            fetch_timeout_ms: 5000,
            max_retries: 3,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 5000,
            simulated_latency_ms: 0,
            bind_address: "0.0.0.0:3001".to_string(),
            jwt_secret: None,
            jwt_public_key: None,
            log_level: "info".to_string(),
        }
    }
}

impl AccessConfig {
    /// Load the configuration from the process environment
    ///
    /// # Environment Variables
    /// - `SCHOOL_ACCESS_CONFIG`: optional path to a configuration file
    /// - `SCHOOL_ACCESS_<FIELD>`: overrides any field, e.g.
    ///   `SCHOOL_ACCESS_FETCH_TIMEOUT_MS=2000`
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_PATH_VAR).ok();
        Self::load(file.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Load the configuration from an optional file and an environment source
    pub fn load(file: Option<&str>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Timeout applied to a single backend request
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Artificial latency of the in-memory directory
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }

    /// Retry policy for backend fetches
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: self.fetch_timeout(),
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let mut source = config::Map::new();
        for (key, value) in vars {
            source.insert(key.to_string(), value.to_string());
        }
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = AccessConfig::load(None, environment(&[])).expect("config should load");
        assert_eq!(config.permissions_api_url, "http://localhost:3001");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert!(config.api_token.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_environment_overrides() {
        let config = AccessConfig::load(
            None,
            environment(&[
                ("SCHOOL_ACCESS_FETCH_TIMEOUT_MS", "250"),
                ("SCHOOL_ACCESS_MAX_RETRIES", "1"),
                ("SCHOOL_ACCESS_API_TOKEN", "token-abc"),
            ]),
        )
        .expect("config should load");

        assert_eq!(config.fetch_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.api_token.as_deref(), Some("token-abc"));

        let policy = config.retry_policy();
        assert_eq!(policy.timeout, Duration::from_millis(250));
        assert_eq!(policy.max_retries, 1);
    }
}
