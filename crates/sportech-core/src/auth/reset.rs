use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Reset state file name in cache directory
const RESET_FILE: &str = "reset.json";

/// Pending password reset, kept between `forgot-password`, `verify-otp`
/// and `reset-password`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResetFlow {
    pub email: String,
    #[serde(default)]
    pub reset_token: Option<String>,
}

impl ResetFlow {
    pub fn start(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            reset_token: None,
        }
    }

    pub fn load(cache_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(cache_dir);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read reset state")?;
        let flow = serde_json::from_str(&contents).context("Failed to parse reset state")?;
        Ok(Some(flow))
    }

    pub fn save(&self, cache_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(cache_dir)?;
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(cache_dir), contents)?;
        Ok(())
    }

    pub fn clear(cache_dir: &Path) -> Result<()> {
        let path = Self::path(cache_dir);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn path(cache_dir: &Path) -> PathBuf {
        cache_dir.join(RESET_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_flow_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ResetFlow::load(dir.path()).unwrap().is_none());

        let mut flow = ResetFlow::start("admin@example.com");
        flow.save(dir.path()).unwrap();
        flow.reset_token = Some("rt-1".to_string());
        flow.save(dir.path()).unwrap();

        let loaded = ResetFlow::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, flow);

        ResetFlow::clear(dir.path()).unwrap();
        assert!(ResetFlow::load(dir.path()).unwrap().is_none());
    }
}
