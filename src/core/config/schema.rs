//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! active_remote = "prod"
//!
//! [defaults]
//! format = "table"
//! no_prompt = false
//!
//! [remotes.prod]
//! url = "https://morpheus.example.com"
//! insecure = false
//!
//! [remotes.prod.active_group]
//! id = 1
//! name = "dev"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: remote URLs must be http(s) and the
//! active remote must name a configured remote.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Remote used when `--remote` is not given
    pub active_remote: Option<String>,

    /// Invocation defaults
    pub defaults: Option<Defaults>,

    /// Configured appliances by name
    pub remotes: BTreeMap<String, RemoteConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(active) = &self.active_remote {
            if !self.remotes.contains_key(active) {
                return Err(ConfigError::InvalidValue(format!(
                    "active remote '{}' is not configured",
                    active
                )));
            }
        }

        for (name, remote) in &self.remotes {
            remote
                .validate()
                .map_err(|e| ConfigError::InvalidValue(format!("remote '{}': {}", name, e)))?;
        }

        if let Some(defaults) = &self.defaults {
            defaults.validate()?;
        }

        Ok(())
    }
}

/// One appliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Appliance base URL
    pub url: String,

    /// Accept invalid TLS certificates (self-signed lab appliances)
    pub insecure: bool,

    /// Cached active group for this appliance
    pub active_group: Option<GroupRef>,
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(format!("url '{}' must start with http:// or https://", self.url));
        }
        Ok(())
    }
}

/// A cached group reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GroupRef {
    pub id: u64,
    pub name: String,
}

/// Invocation defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    /// Default output format
    pub format: Option<String>,

    /// Never prompt unless overridden on the command line
    pub no_prompt: Option<bool>,
}

impl Defaults {
    pub const VALID_FORMATS: &'static [&'static str] = &["table", "json", "yaml", "csv"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(format) = &self.format {
            if !Self::VALID_FORMATS.contains(&format.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid format '{}', must be one of: {}",
                    format,
                    Self::VALID_FORMATS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> RemoteConfig {
        RemoteConfig {
            url: url.to_string(),
            insecure: false,
            active_group: None,
        }
    }

    #[test]
    fn defaults() {
        let config = FileConfig::default();
        assert!(config.active_remote.is_none());
        assert!(config.remotes.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn active_remote_must_exist() {
        let config = FileConfig {
            active_remote: Some("prod".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn remote_url_scheme_checked() {
        let mut config = FileConfig::default();
        config
            .remotes
            .insert("lab".to_string(), remote("morpheus.lab.local"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_format_rejected() {
        let config = FileConfig {
            defaults: Some(Defaults {
                format: Some("xml".to_string()),
                no_prompt: None,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn roundtrip() {
        let mut config = FileConfig {
            active_remote: Some("prod".to_string()),
            defaults: Some(Defaults {
                format: Some("json".to_string()),
                no_prompt: Some(true),
            }),
            ..Default::default()
        };
        let mut prod = remote("https://morpheus.example.com");
        prod.active_group = Some(GroupRef {
            id: 2,
            name: "dev".to_string(),
        });
        config.remotes.insert("prod".to_string(), prod);

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: FileConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}
