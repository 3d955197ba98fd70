//! `AppConfig` struct, config file location and TOML loading.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

/// Config file name inside a config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application directory under the user config home.
const APP_DIR: &str = "omdbmgr";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// OMDb API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// OMDb API configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Search endpoint override (default: `http://www.omdbapi.com/`).
    #[serde(default)]
    pub base_url: Option<String>,
    /// User-Agent override (default: `omdbmgr/<version>`).
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ApiConfig {
    /// Parses the configured base URL, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is set but not a valid URL.
    pub fn parsed_base_url(&self) -> Result<Option<Url>> {
        self.base_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid api.base_url: {raw}")))
            .transpose()
    }
}

impl AppConfig {
    /// Config file path for an optional `--dir` override.
    ///
    /// `{dir}/config.toml` when `dir` is given, otherwise
    /// `$XDG_CONFIG_HOME/omdbmgr/config.toml`, falling back to
    /// `$HOME/.config/omdbmgr/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is `None` and no config home can be found.
    pub fn locate(dir: Option<&Path>) -> Result<PathBuf> {
        locate_with(dir, |key| std::env::var_os(key))
    }

    /// Locates and loads the config for an optional `--dir` override.
    ///
    /// # Errors
    ///
    /// See [`Self::locate`] and [`Self::load`].
    pub fn load_for(dir: Option<&Path>) -> Result<Self> {
        let path = Self::locate(dir)?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::load(&path)
    }

    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Resolves the config path with `env` standing in for the process environment.
///
/// A relative or empty `XDG_CONFIG_HOME` is ignored.
fn locate_with(dir: Option<&Path>, env: impl Fn(&str) -> Option<OsString>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }

    let base = env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| env("HOME").map(|home| PathBuf::from(home).join(".config")))
        .context("neither XDG_CONFIG_HOME nor HOME is set")?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}
