//! Application configuration management.
//!
//! Configuration is stored at `~/.config/policydesk/config.json` and may be
//! overridden per process with environment variables:
//!
//! - `POLICYDESK_API_URL`: base URL of the API service
//! - `POLICYDESK_TIMEOUT_SECS`: per-request timeout
//! - `POLICYDESK_TOKEN_STORE`: `keyring`, `file` or `memory`

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileStore, KeyringStore, MemoryStore, TokenStore};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "policydesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API base URL when neither the environment nor the config file sets one
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

/// Per-request ceiling covering connect and response
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_URL: &str = "POLICYDESK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "POLICYDESK_TIMEOUT_SECS";
pub const ENV_TOKEN_STORE: &str = "POLICYDESK_TOKEN_STORE";

/// Where the credential pair is persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Keyring,
    File,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" | "keychain" => Ok(StoreKind::Keyring),
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(anyhow::anyhow!("Unknown token store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub token_store: Option<StoreKind>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read config file")?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the file, then apply `POLICYDESK_*` environment overrides
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay values from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            let secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))?;
            self.timeout_secs = Some(secs);
        }
        if let Some(kind) = get(ENV_TOKEN_STORE) {
            self.token_store = Some(kind.parse()?);
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn api_url(&self) -> String {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn store_kind(&self) -> StoreKind {
        self.token_store.unwrap_or_default()
    }

    /// Build the token store this configuration selects
    pub fn open_token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.store_kind() {
            StoreKind::Keyring => Arc::new(KeyringStore::default()),
            StoreKind::File => Arc::new(FileStore::new(self.cache_dir()?)),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        })
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.store_kind(), StoreKind::Keyring);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            api_url: Some("http://file.example/api".to_string()),
            ..Config::default()
        };
        config
            .apply_env(env(&[
                (ENV_API_URL, "https://api.example.com/api/v1/"),
                (ENV_TIMEOUT_SECS, "30"),
                (ENV_TOKEN_STORE, "File"),
            ]))
            .unwrap();
        assert_eq!(config.api_url(), "https://api.example.com/api/v1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.store_kind(), StoreKind::File);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[(ENV_API_URL, "  ")])).unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_bad_env_values_are_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[(ENV_TIMEOUT_SECS, "soon")])).is_err());
        assert!(config.apply_env(env(&[(ENV_TOKEN_STORE, "cookie")])).is_err());
    }

    #[test]
    fn test_config_json_shape() {
        let json = r#"{"api_url": "http://x/api", "token_store": "memory"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store_kind(), StoreKind::Memory);
        assert!(config.last_email.is_none());
    }
}
