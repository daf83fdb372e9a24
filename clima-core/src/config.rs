use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Where weatherapi.com lives unless the config says otherwise.
pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// Everything the fetch adapter needs to reach the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: DEFAULT_BASE_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://api.weatherapi.com"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the upstream base URL; mostly useful for testing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "clima", "clima")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Command-line values win over whatever the file says.
    pub fn with_overrides(mut self, api_key: Option<String>, base_url: Option<String>) -> Self {
        if api_key.is_some() {
            self.api_key = api_key;
        }
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    /// Returns the API key, ignoring a blank one.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let api_key = self.api_key().ok_or_else(|| {
            anyhow!(
                "No weatherapi.com API key configured.\n\
                 Hint: run `clima configure` or pass `--api-key <KEY>`."
            )
        })?;

        Ok(ProviderConfig::new(api_key).with_base_url(self.base_url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_config_errors_when_key_not_set() {
        let cfg = Config::default();
        let err = cfg.provider_config().unwrap_err();

        assert!(err.to_string().contains("No weatherapi.com API key configured"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = Config { api_key: Some("   ".into()), base_url: None };
        assert!(cfg.api_key().is_none());
        assert!(cfg.provider_config().is_err());
    }

    #[test]
    fn provider_config_uses_default_base_url() {
        let cfg = Config { api_key: Some("KEY".into()), base_url: None };
        let provider = cfg.provider_config().expect("key is set");

        assert_eq!(provider, ProviderConfig::new("KEY"));
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = Config { api_key: Some("FILE".into()), base_url: None }
            .with_overrides(Some("FLAG".into()), Some("http://localhost:9000".into()));

        assert_eq!(cfg.api_key(), Some("FLAG"));
        assert_eq!(cfg.base_url(), "http://localhost:9000");
    }

    #[test]
    fn absent_overrides_keep_file_values() {
        let cfg = Config { api_key: Some("FILE".into()), base_url: None }.with_overrides(None, None);
        assert_eq!(cfg.api_key(), Some("FILE"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config { api_key: Some("KEY".into()), base_url: Some("http://x".into()) };
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
