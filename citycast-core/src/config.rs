use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CITYCAST_CONFIG";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://api.openweathermap.org/data/2.5"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self { api_key: None, base_url: default_base_url(), timeout_secs: default_timeout_secs() }
    }
}

impl Config {
    /// Load from [`Config::config_file_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// A missing file yields defaults, so a fresh install starts without a key.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save to [`Config::config_file_path`] and return where it went.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write TOML to `path`, creating parent directories. The file holds the API key, so on
    /// Unix it is readable by the owner only.
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

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).with_context(|| {
                format!("Failed to restrict config file permissions: {}", path.display())
            })?;
        }

        Ok(())
    }

    /// `CITYCAST_CONFIG` when set, otherwise `config.toml` in the platform config directory.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "citycast", "citycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        self.api_key = Some(api_key.trim().to_string());
    }

    /// API key from [`API_KEY_ENV`], falling back to the stored key. Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .into_iter()
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_provider() {
        let cfg = Config::default();
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = Config::from_toml("api_key = \"abc\"\n").expect("valid toml");
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn saved_form_parses_back() {
        let mut cfg = Config::default();
        cfg.set_api_key("  KEY  ");

        let toml = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed = Config::from_toml(&toml).expect("parse");
        assert_eq!(parsed.api_key.as_deref(), Some("KEY"));
        assert_eq!(parsed.base_url, cfg.base_url);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn save_creates_directories_and_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config { timeout_secs: 4, ..Config::default() };
        cfg.set_api_key(" KEY ");
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.api_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.timeout(), Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).expect("save");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn unparsable_file_names_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"), "{err:#}");
    }

    #[test]
    fn env_key_wins_over_stored_key() {
        let cfg = Config { api_key: Some("FILE".into()), ..Config::default() };

        assert_eq!(cfg.resolve_api_key_with(Some("ENV".into())).as_deref(), Some("ENV"));
        assert_eq!(cfg.resolve_api_key_with(Some("   ".into())).as_deref(), Some("FILE"));
        assert_eq!(cfg.resolve_api_key_with(None).as_deref(), Some("FILE"));
    }

    #[test]
    fn blank_keys_resolve_to_none() {
        let cfg = Config { api_key: Some(" ".into()), ..Config::default() };
        assert_eq!(cfg.resolve_api_key_with(None), None);
        assert_eq!(Config::default().resolve_api_key_with(Some(String::new())), None);
    }
}
