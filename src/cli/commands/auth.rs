//! cli::commands::auth
//!
//! `login`, `logout` and `whoami`.
//!
//! # Design
//!
//! - Tokens are stored per remote through [`SecretStore`]
//! - Tokens are NEVER printed to stdout/stderr
//! - `login` verifies the token against the appliance before storing it
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for the token)
//! morpheus login
//!
//! # Non-interactive
//! morpheus login --access-token 0f3c...
//!
//! # Remove the stored token
//! morpheus logout
//! ```

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};

use super::common::{require_interactive, secret_store, Connection, Invocation, Renderer, DIRECT_REMOTE};
use crate::api::{HttpTransport, TransportError};
use crate::engine::{Context, Outcome, Reply, Session, EXIT_OK};
use crate::secrets::{token_key, SecretStore};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::{PromptIo, TerminalPrompt};

/// Store a verified token for the target remote.
pub fn login(ctx: &Context, inv: &Invocation, token: Option<String>) -> Result<i32> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let (remote, url, insecure, _) = inv.target()?;
    if remote == DIRECT_REMOTE {
        bail!("--url sessions are not stored; pass --token with each command instead");
    }

    let token = match token {
        Some(token) => token,
        None => {
            require_interactive(ctx, "reading the access token")?;
            TerminalPrompt::new()
                .ask_secret("Access Token")
                .context("Failed to read token")?
        }
    };
    validate_token(&token)?;

    let transport = HttpTransport::new(&url, Some(token.clone()), insecure)?;
    let conn = Connection::new(Session::new(&remote, &url, Arc::new(transport)))?;
    match conn.block_on(conn.session.current_user()) {
        Ok(_) => {}
        Err(TransportError::AuthFailed(_)) => bail!("The appliance rejected the token."),
        Err(err) => return Err(err).context("Failed to verify token"),
    }

    secret_store()?
        .set(&token_key(&remote), &token)
        .context("Failed to store token")?;
    output::success(format!("Logged in to {} ({})", remote, url), verbosity);
    Ok(EXIT_OK)
}

/// Forget the stored token for the target remote.
pub fn logout(ctx: &Context, inv: &Invocation) -> Result<i32> {
    let (remote, ..) = inv.target()?;
    secret_store()?
        .delete(&token_key(&remote))
        .context("Failed to remove stored token")?;
    output::success(
        format!("Logged out from {}", remote),
        Verbosity::from_flags(ctx.quiet, ctx.debug),
    );
    Ok(EXIT_OK)
}

pub fn whoami(ctx: &Context, inv: &Invocation, format: output::OutputFormat) -> Result<i32> {
    let conn = inv.connect()?;
    let outcome = match conn.block_on(conn.session.current_user()) {
        Ok(user) => Outcome::Proceed(Reply::Record(user.get("user").cloned().unwrap_or_else(|| user.clone()))),
        Err(err) => Outcome::Failed(err.into()),
    };
    Renderer::new(ctx, format, &[]).render(outcome, "")
}

/// Basic shape checks; the appliance has the final word.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_shape_is_checked() {
        assert!(validate_token("").is_err());
        assert!(validate_token("abc def").is_err());
        assert!(validate_token("0f3c9a").is_ok());
    }
}
