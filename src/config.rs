//! Startup configuration.
//!
//! Everything is read once from the environment when the process starts and
//! then passed down explicitly.

use crate::api::mock::Latency;
use crate::controllers::search::DEFAULT_DEBOUNCE;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "rxrefill";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/v1";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LOG_FILE: &str = "rxrefill.log";

const ENV_USE_MOCKS: &str = "RXREFILL_USE_MOCKS";
const ENV_API_LOGGING: &str = "RXREFILL_API_LOGGING";
const ENV_API_URL: &str = "RXREFILL_API_URL";
const ENV_API_TIMEOUT_MS: &str = "RXREFILL_API_TIMEOUT_MS";
const ENV_MOCK_LATENCY: &str = "RXREFILL_MOCK_LATENCY";
const ENV_DEBOUNCE_MS: &str = "RXREFILL_DEBOUNCE_MS";
const ENV_LOG_FILE: &str = "RXREFILL_LOG_FILE";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info"
}

/// Which implementation backs the API capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSource {
    Mock,
    Real,
}

impl fmt::Display for ApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiSource::Mock => f.write_str("mock"),
            ApiSource::Real => f.write_str("real"),
        }
    }
}

/// Settings consumed by the API resolver and its implementations.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub source: ApiSource,
    /// Log which implementation each capability resolved to.
    pub logging: bool,
    pub base_url: String,
    pub timeout: Duration,
    pub mock_latency: Latency,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            source: ApiSource::Mock,
            logging: true,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
            mock_latency: Latency::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub search_debounce: Duration,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            search_debounce: DEFAULT_DEBOUNCE,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup(ENV_USE_MOCKS) {
            config.api.source = if parse_bool(ENV_USE_MOCKS, &value)? {
                ApiSource::Mock
            } else {
                ApiSource::Real
            };
        }
        if let Some(value) = lookup(ENV_API_LOGGING) {
            config.api.logging = parse_bool(ENV_API_LOGGING, &value)?;
        }
        if let Some(value) = lookup(ENV_API_URL) {
            let url = value.trim().trim_end_matches('/');
            if url.is_empty() {
                return Err(anyhow!("{ENV_API_URL} must not be empty"));
            }
            config.api.base_url = url.to_string();
        }
        if let Some(value) = lookup(ENV_API_TIMEOUT_MS) {
            config.api.timeout = parse_millis(ENV_API_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MOCK_LATENCY) {
            if !parse_bool(ENV_MOCK_LATENCY, &value)? {
                config.api.mock_latency = Latency::none();
            }
        }
        if let Some(value) = lookup(ENV_DEBOUNCE_MS) {
            config.search_debounce = parse_millis(ENV_DEBOUNCE_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_FILE) {
            config.log_file = PathBuf::from(value);
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{key}: expected a boolean, got {other:?}")),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    let millis = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key}: expected milliseconds, got {value:?}"))?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_mocks_with_logging() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api.source, ApiSource::Mock);
        assert!(config.api.logging);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.log_file, PathBuf::from("rxrefill.log"));
    }

    #[test]
    fn use_mocks_false_selects_real_api() {
        let config = config_from(&[(ENV_USE_MOCKS, "false")]).unwrap();
        assert_eq!(config.api.source, ApiSource::Real);
    }

    #[test]
    fn booleans_accept_common_spellings() {
        for value in ["1", "TRUE", "yes", " on "] {
            assert!(parse_bool("K", value).unwrap());
        }
        for value in ["0", "False", "no", "off"] {
            assert!(!parse_bool("K", value).unwrap());
        }
    }

    #[test]
    fn invalid_boolean_is_an_error() {
        let err = config_from(&[(ENV_API_LOGGING, "maybe")]).unwrap_err();
        assert!(err.to_string().contains(ENV_API_LOGGING));
    }

    #[test]
    fn parses_durations_and_url() {
        let config = config_from(&[
            (ENV_DEBOUNCE_MS, "150"),
            (ENV_API_TIMEOUT_MS, "2500"),
            (ENV_API_URL, "https://rx.example.org/v2/"),
        ])
        .unwrap();
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.api.timeout, Duration::from_millis(2500));
        assert_eq!(config.api.base_url, "https://rx.example.org/v2");
    }

    #[test]
    fn invalid_duration_is_an_error() {
        assert!(config_from(&[(ENV_DEBOUNCE_MS, "fast")]).is_err());
    }

    #[test]
    fn mock_latency_can_be_disabled() {
        let config = config_from(&[(ENV_MOCK_LATENCY, "off")]).unwrap();
        assert_eq!(config.api.mock_latency, Latency::none());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
        assert_eq!(APP_NAME, "rxrefill");
    }
}
