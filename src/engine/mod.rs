//! engine
//!
//! The dynamic resource command engine.
//!
//! # Architecture
//!
//! Every resource verb runs the same pipeline:
//!
//! ```text
//! Resolve -> CheckCapability -> Schema -> Prompt -> Assemble -> Confirm -> DryRunGate -> Transport
//! ```
//!
//! - [`resolver`]: user token (id or name) to a detailed record
//! - [`schema`]: resource types and their ordered field descriptors
//! - [`prompt`]: walks descriptors and produces an answer map
//! - [`assembler`]: merges payload file, `-O` overrides, flags and answers
//! - [`dispatcher`]: the per-verb state machine, batch and nested variants
//! - [`dry_run`]: previews requests instead of sending them
//! - [`permissions`]: the shared visibility/tenants/group-access block
//!
//! # Invariants
//!
//! - No mutating request is sent before every identifier in the invocation
//!   has resolved to exactly one record
//! - Capability checks for sub-resources run before any prompt or mutation
//! - In dry-run mode the transport sees no mutating request
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use morpheus_cli::api::HttpTransport;
//! use morpheus_cli::core::kinds::ROUTER;
//! use morpheus_cli::engine::dispatcher::{Dispatcher, MutationOptions};
//! use morpheus_cli::engine::Session;
//! use morpheus_cli::ui::prompts::TerminalPrompt;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let transport = HttpTransport::new("https://morpheus.example.com", Some("token".into()), false)?;
//! let session = Session::new("prod", "https://morpheus.example.com", Arc::new(transport));
//! let mut io = TerminalPrompt::new();
//! let mut dispatcher = Dispatcher::new(&session, &mut io, MutationOptions::default());
//! let outcome = dispatcher.get(&ROUTER, "web01").await;
//! std::process::exit(outcome.exit_code());
//! # }
//! ```

pub mod assembler;
pub mod dispatcher;
pub mod dry_run;
pub mod outcome;
pub mod permissions;
pub mod prompt;
pub mod resolver;
pub mod schema;

pub use dispatcher::{BatchReport, Dispatcher, MutationOptions, Reply};
pub use outcome::{Candidate, EngineError, Outcome, EXIT_ABORTED, EXIT_FAILURE, EXIT_OK};

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::{endpoints, ApiRequest, Transport, TransportError};
use crate::core::config::GroupRef;

/// Execution context derived from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Never prompt; required fields must be supplied.
    pub no_prompt: bool,
}

/// Everything a command needs to talk to one appliance.
///
/// Replaces ambient state: the active group and the lazily fetched current
/// user live here and are passed explicitly to every component.
pub struct Session {
    /// Configured remote name (or `env` when built from the environment).
    pub remote: String,
    pub url: String,
    transport: Arc<dyn Transport>,
    /// Cached active group for this appliance.
    pub active_group: Option<GroupRef>,
    current_user: OnceCell<Value>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("remote", &self.remote)
            .field("url", &self.url)
            .field("transport", &self.transport.name())
            .field("active_group", &self.active_group)
            .finish()
    }
}

impl Session {
    pub fn new(remote: &str, url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            remote: remote.to_string(),
            url: url.to_string(),
            transport,
            active_group: None,
            current_user: OnceCell::new(),
        }
    }

    pub fn with_active_group(mut self, group: Option<GroupRef>) -> Self {
        self.active_group = group;
        self
    }

    /// Send a request through the transport.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        debug!(transport = self.transport.name(), request = %request, "execute");
        self.transport.execute(request).await
    }

    /// The authenticated user, fetched on first use and memoized.
    pub async fn current_user(&self) -> Result<&Value, TransportError> {
        self.current_user
            .get_or_try_init(|| async { self.execute(&endpoints::whoami()).await })
            .await
    }
}
