//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! Keys are namespaced per appliance (`remote.<name>.access_token`) so one
//! store can hold credentials for several remotes.
//!
//! Implementations must never log, print, or include secret values in error
//! messages, and must be `Send + Sync`.

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages never include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to read secret store: {0}")]
    ReadError(String),

    #[error("failed to write secret store: {0}")]
    WriteError(String),
}

/// Key-value storage for credentials.
pub trait SecretStore: Send + Sync {
    /// Get a secret by key; `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Store key holding the access token of a remote.
pub fn token_key(remote: &str) -> String {
    format!("remote.{}.access_token", remote)
}
