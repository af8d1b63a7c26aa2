use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Backend the dev proxy pointed at in the original setup.
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// User configuration, stored as JSON under the platform config directory.
/// None of these settings change the submission contract; they only select
/// where requests go and how chatty the log file is.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub enable_logs: Option<bool>,
    pub log_api_calls: Option<bool>,
}

impl Config {
    /// Loads the config file, seeding a template with the defaults on first
    /// run. The `STORYTIME_API_URL` env var overrides the file's URL.
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok();
        Self::load_with(path.as_deref(), std::env::var("STORYTIME_API_URL").ok())
    }

    fn load_with(path: Option<&Path>, env_api_url: Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    let _ = Self::template().save_to(path);
                }
                Self::load_from(path)?
            }
            None => Self::default(),
        };
        if let Some(url) = env_api_url.filter(|u| !u.is_empty()) {
            config.api_url = Some(url);
        }
        Ok(config)
    }

    /// First-run file contents: the defaults spelled out so the written
    /// file documents itself.
    fn template() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            enable_logs: Some(false),
            log_api_calls: Some(false),
        }
    }

    /// Applies the CLI flag; it beats both the config file and the env var.
    pub fn override_api_url(&mut self, url: Option<String>) {
        if let Some(url) = url {
            self.api_url = Some(url);
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn logs_enabled(&self) -> bool {
        self.enable_logs.unwrap_or(false)
    }

    pub fn log_api_calls(&self) -> bool {
        self.log_api_calls.unwrap_or(false)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;
        Ok(config_dir.join("storytime").join("config.json"))
    }

    /// Where the log file goes when logging is enabled.
    pub fn log_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;
        Ok(config_dir.join("storytime").join("storytime.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_millis(30_000));
        assert!(!config.logs_enabled());
        assert!(!config.log_api_calls());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_url: Some("https://stories.example.com".to_string()),
            timeout_ms: Some(5_000),
            enable_logs: Some(true),
            log_api_calls: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url(), "https://stories.example.com");
        assert_eq!(loaded.timeout(), Duration::from_millis(5_000));
        assert!(loaded.logs_enabled());
        assert!(!loaded.log_api_calls());
    }

    #[test]
    fn unknown_url_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"timeout_ms": 1000}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url(), DEFAULT_API_URL);
        assert_eq!(loaded.timeout(), Duration::from_millis(1_000));
    }

    #[test]
    fn env_var_overrides_file_api_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "http://from-file:5001"}"#).unwrap();

        let config =
            Config::load_with(Some(&path), Some("http://from-env:5001".to_string())).unwrap();
        assert_eq!(config.api_url(), "http://from-env:5001");
    }

    #[test]
    fn empty_env_var_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "http://from-file:5001"}"#).unwrap();

        let config = Config::load_with(Some(&path), Some(String::new())).unwrap();
        assert_eq!(config.api_url(), "http://from-file:5001");
    }

    #[test]
    fn cli_flag_beats_env_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "http://from-file:5001"}"#).unwrap();

        let mut config =
            Config::load_with(Some(&path), Some("http://from-env:5001".to_string())).unwrap();
        config.override_api_url(Some("http://from-cli:5001".to_string()));
        assert_eq!(config.api_url(), "http://from-cli:5001");

        // No flag given: the env value stands
        let mut config =
            Config::load_with(Some(&path), Some("http://from-env:5001".to_string())).unwrap();
        config.override_api_url(None);
        assert_eq!(config.api_url(), "http://from-env:5001");
    }

    #[test]
    fn first_run_seeds_template_with_concrete_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_with(Some(&path), None).unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));

        // The written template spells the defaults out instead of nulls
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(DEFAULT_API_URL));
        assert!(written.contains("30000"));
        assert!(!written.contains("null"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
