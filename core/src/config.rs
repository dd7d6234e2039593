//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://wakatime.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Where the provider lives and how long a single round-trip may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Provider origin; OAuth endpoints and `/api/v1` hang off it.
    pub base_url: String,
    /// Whole-request limit in milliseconds. Zero disables the limit.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: concat!("wakatime-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `WAKATIME_BASE_URL` and `WAKATIME_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("WAKATIME_BASE_URL") {
            config = config.with_base_url(&base_url);
        }
        if let Ok(raw) = std::env::var("WAKATIME_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("WAKATIME_TIMEOUT_SECS is not a number: {raw}")))?;
            if secs == 0 {
                return Err(Error::Config("WAKATIME_TIMEOUT_SECS must be at least 1".to_string()));
            }
            config.timeout_ms = secs.saturating_mul(1_000);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Rounded up to the next millisecond.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/oauth/authorize", self.base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    pub fn revoke_url(&self) -> String {
        format!("{}/oauth/revoke", self.base_url)
    }

    pub fn api_url(&self) -> String {
        format!("{}/api/v1", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_wakatime() {
        let config = ClientConfig::default();
        assert_eq!(config.token_url(), "https://wakatime.com/oauth/token");
        assert_eq!(config.authorize_url(), "https://wakatime.com/oauth/authorize");
        assert_eq!(config.revoke_url(), "https://wakatime.com/oauth/revoke");
        assert_eq!(config.api_url(), "https://wakatime.com/api/v1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:3000/");
        assert_eq!(config.api_url(), "http://127.0.0.1:3000/api/v1");
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_ms":5000}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn sub_second_timeouts_survive() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_millis(500));

        let config = ClientConfig::default().with_timeout(Duration::from_micros(1));
        assert_eq!(config.timeout(), Duration::from_millis(1));
    }

    // One test owns these variables; nothing else in the crate reads them.
    #[test]
    fn from_env_overrides_and_validates() {
        std::env::set_var("WAKATIME_BASE_URL", "http://localhost:9000/");
        std::env::set_var("WAKATIME_TIMEOUT_SECS", " 7 ");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout(), Duration::from_secs(7));

        std::env::set_var("WAKATIME_TIMEOUT_SECS", "soon");
        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("soon")));

        std::env::set_var("WAKATIME_TIMEOUT_SECS", "0");
        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("at least 1")));

        std::env::remove_var("WAKATIME_BASE_URL");
        std::env::remove_var("WAKATIME_TIMEOUT_SECS");
    }
}
