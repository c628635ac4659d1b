/// Runtime configuration for both extension contexts
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Field, Result};

pub const DEFAULT_API_BASE: &str = "https://stg-api.accelerate.unic.ac.cy";

/// Storage key under which the bearer token lives
pub const TOKEN_KEY: &str = "token";

const LOGIN_PATH: &str = "auth/login";
const SCRAPE_PATH: &str = "my-files/webscraping";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub max_login_attempts: usize,
    pub login_cooldown_ms: u64,
    pub save_throttle_ms: u64,
    pub request_timeout_ms: u64,
    pub success_dwell_ms: u64,
    pub error_dwell_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: option_env!("SCRAPE_SAVER_API_BASE")
                .unwrap_or(DEFAULT_API_BASE)
                .to_string(),
            max_login_attempts: 5,
            login_cooldown_ms: 30_000,
            save_throttle_ms: 3_000,
            request_timeout_ms: 15_000,
            success_dwell_ms: 3_000,
            error_dwell_ms: 5_000,
        }
    }
}

impl Config {
    /// Parse a JSON override; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::validation(Field::Other, format!("Invalid config: {}", e)))?;
        config.validated()
    }

    /// Compiled-in defaults, checked before use.
    pub fn built_in() -> Result<Config> {
        Config::default().validated()
    }

    pub fn validated(self) -> Result<Config> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_url()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::validation(
                Field::Other,
                format!("API base must be http(s): {}", self.api_base),
            ));
        }
        if self.max_login_attempts == 0 {
            return Err(Error::validation(Field::Other, "max_login_attempts must be > 0"));
        }
        if self.login_cooldown_ms == 0 || self.save_throttle_ms == 0 || self.request_timeout_ms == 0 {
            return Err(Error::validation(Field::Other, "intervals must be > 0"));
        }
        Ok(())
    }

    pub fn login_url(&self) -> Result<Url> {
        self.endpoint(LOGIN_PATH)
    }

    pub fn scrape_url(&self) -> Result<Url> {
        self.endpoint(SCRAPE_PATH)
    }

    pub fn login_cooldown(&self) -> Duration {
        Duration::from_millis(self.login_cooldown_ms)
    }

    pub fn save_throttle(&self) -> Duration {
        Duration::from_millis(self.save_throttle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn base_url(&self) -> Result<Url> {
        // A trailing slash makes `join` append instead of replacing the last segment
        let mut base = self.api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).map_err(|e| {
            Error::validation(Field::Other, format!("Invalid API base {}: {}", self.api_base, e))
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url()?
            .join(path)
            .map_err(|e| Error::validation(Field::Other, format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.login_cooldown(), Duration::from_secs(30));
        assert_eq!(config.save_throttle(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_built_in_config_is_valid() {
        assert_eq!(Config::built_in(), Ok(Config::default()));
    }

    #[test]
    fn test_validated_rejects_unusable_config() {
        let config = Config {
            api_base: "ftp://files.example.com".to_string(),
            ..Config::default()
        };
        assert_eq!(config.validated().unwrap_err().code(), "E300");

        let config = Config {
            request_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_endpoints() {
        let config = Config {
            api_base: "https://api.example.com".to_string(),
            ..Config::default()
        };
        assert_eq!(config.login_url().unwrap().as_str(), "https://api.example.com/auth/login");
        assert_eq!(
            config.scrape_url().unwrap().as_str(),
            "https://api.example.com/my-files/webscraping"
        );
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let config = Config {
            api_base: "https://example.com/api/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.login_url().unwrap().as_str(), "https://example.com/api/auth/login");
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = Config::from_json(r#"{"max_login_attempts": 3}"#).unwrap();
        assert_eq!(config.max_login_attempts, 3);
        assert_eq!(config.save_throttle_ms, 3_000);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(Config::from_json(r#"{"api_base": "ftp://example.com"}"#).is_err());
        assert!(Config::from_json(r#"{"api_base": "not a url"}"#).is_err());
        assert!(Config::from_json(r#"{"max_login_attempts": 0}"#).is_err());
        assert!(Config::from_json("{").is_err());
    }
}
