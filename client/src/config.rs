use std::time::Duration;

use crate::error::ConfigError;

/// Listing Service address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Per-request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_URL: &str = "LOPPIS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "LOPPIS_TIMEOUT_SECS";

/// Where and how to reach the Listing Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash, e.g. `"http://localhost:8000"`.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout from a whole number of seconds. Zero is rejected.
    pub fn with_timeout_secs(self, secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidTimeout(secs.to_string()));
        }
        Ok(self.with_timeout(Duration::from_secs(secs)))
    }

    /// Read `LOPPIS_API_URL` and `LOPPIS_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => Self::new(url.trim()),
            None => Self::default(),
        };
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config = config.with_timeout_secs(secs)?;
        }
        Ok(config)
    }
}
