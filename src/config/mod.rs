use crate::utils::SETTINGS_FILE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Live listing of every USCIS form
pub const DEFAULT_FORMS_INDEX_URL: &str = "https://www.uscis.gov/forms/all-forms";

/// Origin prepended to root-relative `/sites/...` links
pub const DEFAULT_BASE_ORIGIN: &str = "https://www.uscis.gov";

fn default_forms_index_url() -> String {
    DEFAULT_FORMS_INDEX_URL.to_string()
}

fn default_base_origin() -> String {
    DEFAULT_BASE_ORIGIN.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_download_timeout_secs() -> u64 {
    10
}

fn default_download_delay_ms() -> u64 {
    200
}

/// Runtime settings, read from `settings.json` in the data directory.
/// Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_forms_index_url")]
    pub forms_index_url: String,
    #[serde(default = "default_base_origin")]
    pub base_origin: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Pause between consecutive downloads in a batch
    #[serde(default = "default_download_delay_ms")]
    pub download_delay_ms: u64,
    /// Keep user-added forms that a sync does not rediscover
    #[serde(default)]
    pub preserve_custom_forms: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            forms_index_url: default_forms_index_url(),
            base_origin: default_base_origin(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            download_delay_ms: default_download_delay_ms(),
            preserve_custom_forms: false,
        }
    }
}

impl AppConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }
}

/// Read the settings file
pub async fn read_config(data_dir: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let config_path = data_dir.join(SETTINGS_FILE);

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).await?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// Write the settings file
pub async fn write_config(data_dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    fs::create_dir_all(data_dir).await?;
    let config_path = data_dir.join(SETTINGS_FILE);
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"fetchTimeoutSecs": 5, "preserveCustomForms": true}"#)
                .unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert!(config.preserve_custom_forms);
        assert_eq!(config.forms_index_url, DEFAULT_FORMS_INDEX_URL);
        assert_eq!(config.download_timeout_secs, 10);
        assert_eq!(config.download_delay_ms, 200);
    }

    #[tokio::test]
    async fn test_read_missing_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            base_origin: "http://localhost:8080".to_string(),
            ..Default::default()
        };
        write_config(dir.path(), &config).await.unwrap();

        let loaded = read_config(dir.path()).await.unwrap();
        assert_eq!(loaded, Some(config));
    }
}
