//! secrets
//!
//! Storage for appliance access tokens.
//!
//! # Security
//!
//! - Tokens are **never** logged or included in error messages
//! - The file store uses 0600 permissions on Unix
//! - All writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```ignore
//! use morpheus_cli::secrets::{token_key, FileSecretStore, SecretStore};
//!
//! let store = FileSecretStore::new()?;
//! store.set(&token_key("prod"), "0f3c...")?;
//! let token = store.get(&token_key("prod"))?;
//! ```

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{token_key, SecretError, SecretStore};
