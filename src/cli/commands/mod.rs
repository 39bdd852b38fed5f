//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each resource handler:
//! 1. Turns its flags into an [`AssemblyInput`](crate::engine::assembler::AssemblyInput)
//! 2. Runs one [`Dispatcher`](crate::engine::Dispatcher) verb on a connection
//! 3. Renders the outcome and returns the process exit code
//!
//! Handlers never build request bodies or call the transport for mutations
//! themselves.
//!
//! # Async
//!
//! The engine is async. Each handler owns a current-thread tokio runtime via
//! [`common::Connection`] and blocks on the dispatcher future.

mod auth;
mod common;
mod completion;
mod groups;
mod instances;
mod networks;
mod remote;
mod resources;
mod roles;
mod routers;

pub use common::Invocation;
pub use completion::completion;

use anyhow::Result;

use crate::cli::args::Command;
use crate::engine::Context;

/// Dispatch a command to its handler and return the exit code.
pub fn dispatch(command: Command, ctx: &Context, inv: Invocation) -> Result<i32> {
    match command {
        Command::Remote { action } => remote::run(ctx, inv, action),
        Command::Login { access_token } => auth::login(ctx, &inv, access_token),
        Command::Logout => auth::logout(ctx, &inv),
        Command::Whoami { output } => auth::whoami(ctx, &inv, inv.format(&output)),
        Command::Groups { action } => groups::run(ctx, inv, action),
        Command::Routers { action } => routers::run(ctx, &inv, action),
        Command::Networks { action } => networks::run(ctx, &inv, action),
        Command::Instances { action } => instances::run(ctx, &inv, action),
        Command::Roles { action } => roles::run(ctx, &inv, action),
        Command::Completion { shell } => completion::completion(shell),
    }
}
