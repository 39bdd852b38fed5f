//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order:
//! 1. `$MORPHEUS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/morpheus/config.toml`
//! 3. `~/.morpheus/config.toml` (canonical write location)
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment (`MORPHEUS_URL`, `MORPHEUS_TOKEN`; handled by the CLI)
//! 4. CLI flags (not handled here)
//!
//! # Example
//!
//! ```no_run
//! use morpheus_cli::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! if let Some((name, remote)) = config.remote(None) {
//!     println!("{} -> {}", name, remote.url);
//! }
//! ```

pub mod schema;

pub use schema::{Defaults, FileConfig, GroupRef, RemoteConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown remote '{0}'")]
    UnknownRemote(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration plus the file it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    /// Path the config was loaded from; writes go back here
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Missing files are not an error (defaults are used).
    pub fn load() -> Result<Config, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config {
            file: FileConfig::default(),
            path: Self::canonical_path().ok(),
        })
    }

    /// Load configuration from an explicit file.
    ///
    /// A missing file yields defaults bound to that path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Ok(Config {
                file: FileConfig::default(),
                path: Some(path.to_path_buf()),
            });
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("MORPHEUS_CONFIG") {
            // An explicit location is authoritative even when absent.
            return vec![PathBuf::from(path)];
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("morpheus/config.toml"));
        }
        if let Ok(canonical) = Self::canonical_path() {
            paths.push(canonical);
        }
        paths
    }

    /// The canonical config path, `~/.morpheus/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("MORPHEUS_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".morpheus/config.toml"))
    }

    /// Path the configuration is bound to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate and write the configuration back to its file atomically.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        self.file.validate()?;
        let path = match &self.path {
            Some(p) => p.clone(),
            None => Self::canonical_path()?,
        };
        write_config_atomic(&path, &self.file)?;
        Ok(path)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Resolve a remote by name, or the active remote when `name` is `None`.
    pub fn remote(&self, name: Option<&str>) -> Option<(&str, &RemoteConfig)> {
        let name = name.or(self.file.active_remote.as_deref())?;
        self.file
            .remotes
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Add or replace a remote. The first remote added becomes active.
    pub fn add_remote(&mut self, name: &str, url: &str, insecure: bool) -> Result<(), ConfigError> {
        let remote = RemoteConfig {
            url: url.trim_end_matches('/').to_string(),
            insecure,
            active_group: None,
        };
        remote.validate().map_err(ConfigError::InvalidValue)?;
        self.file.remotes.insert(name.to_string(), remote);
        if self.file.active_remote.is_none() {
            self.file.active_remote = Some(name.to_string());
        }
        Ok(())
    }

    /// Remove a remote, clearing the active remote if it pointed there.
    pub fn remove_remote(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.file.remotes.remove(name).is_none() {
            return Err(ConfigError::UnknownRemote(name.to_string()));
        }
        if self.file.active_remote.as_deref() == Some(name) {
            self.file.active_remote = None;
        }
        Ok(())
    }

    /// Make a configured remote the active one.
    pub fn use_remote(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.file.remotes.contains_key(name) {
            return Err(ConfigError::UnknownRemote(name.to_string()));
        }
        self.file.active_remote = Some(name.to_string());
        Ok(())
    }

    /// Cache (or clear) the active group for a remote.
    pub fn set_active_group(
        &mut self,
        remote: &str,
        group: Option<GroupRef>,
    ) -> Result<(), ConfigError> {
        let entry = self
            .file
            .remotes
            .get_mut(remote)
            .ok_or_else(|| ConfigError::UnknownRemote(remote.to_string()))?;
        entry.active_group = group;
        Ok(())
    }

    /// Default output format name, `table` if not configured.
    pub fn default_format(&self) -> &str {
        self.file
            .defaults
            .as_ref()
            .and_then(|d| d.format.as_deref())
            .unwrap_or("table")
    }

    /// Whether prompting is disabled by default.
    pub fn no_prompt(&self) -> bool {
        self.file
            .defaults
            .as_ref()
            .and_then(|d| d.no_prompt)
            .unwrap_or(false)
    }
}

/// Write a config file atomically (temp file, then rename).
fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(contents.as_bytes())
        .map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

    file.sync_all().map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("config.toml")).unwrap();
        assert!(config.remote(None).is_none());
        assert_eq!(config.default_format(), "table");
        assert!(!config.no_prompt());
    }

    #[test]
    fn add_use_and_save_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");

        let mut config = Config::load_from(&path).unwrap();
        config.add_remote("lab", "https://lab.example.com/", false).unwrap();
        config.add_remote("prod", "https://prod.example.com", true).unwrap();
        assert_eq!(config.remote(None).unwrap().0, "lab");

        config.use_remote("prod").unwrap();
        config
            .set_active_group(
                "prod",
                Some(GroupRef {
                    id: 4,
                    name: "dev".to_string(),
                }),
            )
            .unwrap();
        config.save().unwrap();

        let loaded = Config::load_from(&path).unwrap();
        let (name, remote) = loaded.remote(None).unwrap();
        assert_eq!(name, "prod");
        assert_eq!(remote.active_group.as_ref().unwrap().id, 4);
        assert!(remote.insecure);
        assert_eq!(loaded.remote(Some("lab")).unwrap().1.url, "https://lab.example.com");
    }

    #[test]
    fn removing_active_remote_clears_it() {
        let mut config = Config::default();
        config.add_remote("lab", "https://lab.example.com", false).unwrap();
        config.remove_remote("lab").unwrap();
        assert!(config.file.active_remote.is_none());
        assert!(matches!(
            config.remove_remote("lab"),
            Err(ConfigError::UnknownRemote(_))
        ));
    }

    #[test]
    fn bad_url_rejected_on_add() {
        let mut config = Config::default();
        assert!(config.add_remote("lab", "ftp://lab", false).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "active_remote = \"x\"\nmystery = 1\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
