//! cli::commands::remote
//!
//! Manage the appliances listed in the config file.

use anyhow::{Context as _, Result};

use super::common::{secret_store, Invocation};
use crate::cli::args::RemoteAction;
use crate::engine::{Context, EXIT_OK};
use crate::secrets::{token_key, SecretStore};
use crate::ui::output::{self, Verbosity};

pub fn run(ctx: &Context, mut inv: Invocation, action: RemoteAction) -> Result<i32> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    match action {
        RemoteAction::Add {
            name,
            url,
            insecure,
            make_active,
        } => {
            inv.config.add_remote(&name, &url, insecure)?;
            if make_active {
                inv.config.use_remote(&name)?;
            }
            let path = inv.config.save().context("Failed to save config")?;
            output::success(format!("Added remote {} ({})", name, url), verbosity);
            output::debug(format!("config written to {}", path.display()), verbosity);
        }
        RemoteAction::List => {
            let active = inv.config.file.active_remote.as_deref();
            if inv.config.file.remotes.is_empty() {
                output::print("No remotes configured.", verbosity);
            }
            for (name, remote) in &inv.config.file.remotes {
                let marker = if Some(name.as_str()) == active { "*" } else { " " };
                let group = remote
                    .active_group
                    .as_ref()
                    .map(|g| format!("  [group: {}]", g.name))
                    .unwrap_or_default();
                println!("{} {}  {}{}", marker, name, remote.url, group);
            }
        }
        RemoteAction::Use { name } => {
            inv.config.use_remote(&name)?;
            inv.config.save().context("Failed to save config")?;
            output::success(format!("Active remote is now {}", name), verbosity);
        }
        RemoteAction::Remove { name } => {
            inv.config.remove_remote(&name)?;
            inv.config.save().context("Failed to save config")?;
            secret_store()?
                .delete(&token_key(&name))
                .context("Failed to remove stored token")?;
            output::success(format!("Removed remote {}", name), verbosity);
        }
        RemoteAction::Current => {
            let (name, url, ..) = inv.target()?;
            println!("{}  {}", name, url);
        }
    }
    Ok(EXIT_OK)
}
