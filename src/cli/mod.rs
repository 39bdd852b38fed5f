//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers and turn their result into an exit code
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds a session
//! from configuration, and hands each verb to the [`crate::engine`]
//! dispatcher. Nothing here talks to the appliance directly.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::engine::{self, EXIT_FAILURE};
use crate::ui::output;

/// Run the CLI application and return the process exit code.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> i32 {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            output::error(err);
            return EXIT_FAILURE;
        }
    };

    let ctx = engine::Context {
        debug: cli.debug,
        quiet: cli.quiet,
        no_prompt: cli.no_prompt || config.no_prompt(),
    };
    let invocation = commands::Invocation {
        config,
        remote: cli.remote,
        url: cli.url,
        token: cli.token,
    };

    match commands::dispatch(cli.command, &ctx, invocation) {
        Ok(code) => code,
        Err(err) => {
            output::error(format!("{:#}", err));
            EXIT_FAILURE
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise `--debug` selects debug.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
