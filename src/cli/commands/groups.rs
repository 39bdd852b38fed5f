//! cli::commands::groups
//!
//! Groups are read-only here, apart from the cached active group which
//! `add` flows use as their default `site`.

use anyhow::{Context as _, Result};

use super::common::{fail, Invocation};
use super::resources;
use crate::cli::args::GroupAction;
use crate::core::config::GroupRef;
use crate::core::kinds::GROUP;
use crate::engine::resolver::Resolver;
use crate::engine::{Context, EXIT_OK};
use crate::ui::output::{self, Verbosity};

pub fn run(ctx: &Context, mut inv: Invocation, action: GroupAction) -> Result<i32> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    match action {
        GroupAction::List(args) => resources::list(ctx, &inv, &GROUP, &args),
        GroupAction::Get(args) => resources::get(ctx, &inv, &GROUP, &args),
        GroupAction::Use { group } => {
            let conn = inv.connect()?;
            let group = match conn.block_on(Resolver::new(&conn.session).resolve(&GROUP, &group)) {
                Ok(group) => group,
                Err(err) => return Ok(fail(err)),
            };
            let remote = conn.session.remote.clone();
            inv.config
                .set_active_group(
                    &remote,
                    Some(GroupRef {
                        id: group.id,
                        name: group.name.clone(),
                    }),
                )
                .context("Failed to set active group")?;
            inv.config.save().context("Failed to save config")?;
            output::success(format!("Active group is now {} ({})", group.name, group.id), verbosity);
            Ok(EXIT_OK)
        }
        GroupAction::Unuse => {
            let (remote, ..) = inv.target()?;
            inv.config
                .set_active_group(&remote, None)
                .context("Failed to clear active group")?;
            inv.config.save().context("Failed to save config")?;
            output::success("Active group cleared", verbosity);
            Ok(EXIT_OK)
        }
    }
}
