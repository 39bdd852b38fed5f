//! secrets::file_store
//!
//! File-backed token storage at `~/.morpheus/secrets.toml`.
//!
//! The file is a flat TOML table of key to token. It is created with 0600
//! permissions on Unix and always replaced through a temp file + rename.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

/// File-based secret storage.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Open the store at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self {
            path: home.join(".morpheus").join("secrets.toml"),
        })
    }

    /// Open the store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_secrets(&self) -> Result<BTreeMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read secrets file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|_| SecretError::ReadError("cannot parse secrets file".into()))
    }

    fn write_secrets(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(secrets)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize secrets: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict before any content lands on disk.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {}", e)))?;

            file.write_all(content.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write secrets: {}", e)))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.read_secrets()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut secrets = self.read_secrets()?;
        secrets.insert(key.to_string(), value.to_string());
        self.write_secrets(&secrets)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut secrets = self.read_secrets()?;
        if secrets.remove(key).is_none() {
            return Ok(());
        }
        self.write_secrets(&secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::token_key;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));
        (temp, store)
    }

    #[test]
    fn get_missing_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get(&token_key("prod")).expect("get").is_none());
    }

    #[test]
    fn tokens_are_kept_per_remote() {
        let (_temp, store) = create_test_store();
        store.set(&token_key("prod"), "t-prod").expect("set prod");
        store.set(&token_key("lab"), "t-lab").expect("set lab");

        assert_eq!(store.get(&token_key("prod")).expect("get"), Some("t-prod".to_string()));
        assert_eq!(store.get(&token_key("lab")).expect("get"), Some("t-lab".to_string()));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_temp, store) = create_test_store();
        store.set("k", "v").expect("set");
        store.delete("k").expect("delete");
        store.delete("k").expect("delete again");
        assert!(!store.exists("k").expect("exists"));
    }

    #[test]
    fn persists_across_instances() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("sub").join("secrets.toml");
        FileSecretStore::with_path(path.clone())
            .set("k", "v")
            .expect("set");
        assert_eq!(
            FileSecretStore::with_path(path).get("k").expect("get"),
            Some("v".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        let (_temp, store) = create_test_store();
        store.set("k", "v").expect("set");
        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn parse_errors_do_not_echo_content() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), "secret-token-value = [unclosed").expect("write");
        let err = store.get("k").unwrap_err().to_string();
        assert!(err.contains("cannot parse"));
        assert!(!err.contains("secret-token-value"));
    }
}
