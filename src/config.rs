//! Top-level application configuration.
//!
//! Configuration is stored in `.deltadesk/config.yaml` and includes:
//! - Backend API base URL and request timeout
//! - List behavior: page size, search debounce, page cache freshness

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::paths;

pub const DEFAULT_API_URL: &str = "https://ec2api.deltatech-backend.com/api/v1";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub list: ListConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Total request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// List screen behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Items requested per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiescence window for search inputs in milliseconds (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a fetched page may be served from cache, in seconds (default: 300)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_page_size() -> u32 {
    20
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Keys accepted by `config get` / `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "api.url",
    "api.timeout_secs",
    "list.page_size",
    "list.debounce_ms",
    "list.cache_ttl_secs",
];

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        paths::config_path()
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// API base URL from environment variable or config file
    pub fn api_url(&self) -> String {
        if let Ok(url) = env::var("DELTADESK_API_URL")
            && !url.is_empty()
        {
            return url;
        }
        self.api.url.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.list.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list.cache_ttl_secs)
    }

    /// Read a value by dot-notation key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "api.url" => self.api_url(),
            "api.timeout_secs" => self.api.timeout_secs.to_string(),
            "list.page_size" => self.list.page_size.to_string(),
            "list.debounce_ms" => self.list.debounce_ms.to_string(),
            "list.cache_ttl_secs" => self.list.cache_ttl_secs.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a value by dot-notation key, validating the value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.url" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| DeskError::Config(format!("invalid api.url '{value}': {e}")))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(DeskError::Config(format!(
                        "invalid api.url '{value}': expected an http or https URL"
                    )));
                }
                self.api.url = value.trim_end_matches('/').to_string();
            }
            "api.timeout_secs" => self.api.timeout_secs = parse_number(key, value)?,
            "list.page_size" => {
                let size: u32 = parse_number(key, value)?;
                if size == 0 {
                    return Err(DeskError::Config(
                        "list.page_size must be greater than zero".to_string(),
                    ));
                }
                self.list.page_size = size;
            }
            "list.debounce_ms" => self.list.debounce_ms = parse_number(key, value)?,
            "list.cache_ttl_secs" => self.list.cache_ttl_secs = parse_number(key, value)?,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        DeskError::Config(format!(
            "invalid value '{value}' for {key}. Expected a non-negative integer"
        ))
    })
}

fn unknown_key(key: &str) -> DeskError {
    if let Some(pos) = key.find('_')
        && !key.contains('.')
    {
        let dot_version = format!("{}.{}", &key[..pos], &key[pos + 1..]);
        return DeskError::Config(format!(
            "invalid config key '{key}'. Use dot notation: '{dot_version}'"
        ));
    }
    DeskError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api.url, DEFAULT_API_URL);
        assert_eq!(config.list.page_size, 20);
        assert_eq!(config.debounce_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml_ng::from_str("list:\n  page_size: 50\n").unwrap();
        assert_eq!(config.list.page_size, 50);
        assert_eq!(config.list.debounce_ms, 500);
        assert_eq!(config.api.timeout_secs, 60);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("list.debounce_ms", "250").unwrap();
        config.set("api.url", "http://localhost:8000/api/v1/").unwrap();
        assert_eq!(config.get("list.debounce_ms").unwrap(), "250");
        assert_eq!(config.api.url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("list.page_size", "0").is_err());
        assert!(config.set("list.page_size", "many").is_err());
        assert!(config.set("api.url", "ftp://example.com").is_err());
        assert!(config.set("api.url", "not a url").is_err());
    }

    #[test]
    fn test_unknown_key_suggests_dot_notation() {
        let mut config = Config::default();
        let err = config.set("api_url", "x").unwrap_err().to_string();
        assert!(err.contains("Use dot notation: 'api.url'"));

        let err = config.get("list.colour").unwrap_err().to_string();
        assert!(err.contains("unknown config key"));
    }
}
