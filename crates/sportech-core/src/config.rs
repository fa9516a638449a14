//! Application configuration management.
//!
//! Holds the API base URL, the cache TTL and the last admin email used.
//! Configuration is stored at `~/.config/sportech/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sportech";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "SPORTECH_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub ttl_hours: Option<u64>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
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

    /// Cache freshness window; 12 hours unless configured.
    pub fn ttl(&self) -> Duration {
        self.ttl_or(None)
    }

    /// Freshness window with an override (in hours) taking precedence.
    pub fn ttl_or(&self, override_hours: Option<u64>) -> Duration {
        override_hours
            .or(self.ttl_hours)
            .map(|h| Duration::from_secs(h.saturating_mul(3600)))
            .unwrap_or(DEFAULT_TTL)
    }

    /// Base URL with an override taking precedence over the stored value.
    pub fn api_base_url_or(&self, override_url: Option<&str>) -> Option<String> {
        override_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| self.api_base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ttl(), DEFAULT_TTL);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sportech").join("config.json");
        let config = Config {
            api_base_url: Some("https://api.example.com/api".to_string()),
            ttl_hours: Some(1),
            last_email: Some("admin@example.com".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.ttl(), Duration::from_secs(3600));
        assert_eq!(loaded.ttl_or(Some(2)), Duration::from_secs(7200));
    }

    #[test]
    fn test_api_url_override() {
        let config = Config {
            api_base_url: Some("https://stored".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url_or(None).as_deref(), Some("https://stored"));
        assert_eq!(config.api_base_url_or(Some("  ")).as_deref(), Some("https://stored"));
        assert_eq!(
            config.api_base_url_or(Some("https://env")).as_deref(),
            Some("https://env")
        );
    }
}
