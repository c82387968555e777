use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RelatiqError;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_PREFERENCES_PATH: &str = ".relatiq/preferences.json";

/// Explorer configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the knowledge-graph REST API.
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Quiet period before a free-text entity search triggers a fetch.
    pub search_debounce: Duration,
    /// Where the theme preference is persisted.
    pub preferences_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, RelatiqError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelatiqError> {
        let api_base_url = lookup("RELATIQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_base_url).map_err(|e| {
            RelatiqError::Config(format!("RELATIQ_API_URL is not a valid URL ({api_base_url}): {e}"))
        })?;

        let timeout_secs = parse_number(&lookup, "RELATIQ_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let debounce_ms = parse_number(&lookup, "RELATIQ_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS)?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
            search_debounce: Duration::from_millis(debounce_ms),
            preferences_path: lookup("RELATIQ_PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_PATH)),
        })
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, RelatiqError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RelatiqError::Config(format!("{key} must be a number, got {raw:?}"))),
    }
}
