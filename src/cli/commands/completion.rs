//! cli::commands::completion

use std::io::Write;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, shells, Generator};

use crate::cli::args::{Cli, Shell};
use crate::engine::EXIT_OK;

/// Write the completion script for `shell` to stdout.
pub fn completion(shell: Shell) -> Result<i32> {
    let mut out = std::io::stdout();
    match shell {
        Shell::Bash => write_script(shells::Bash, &mut out),
        Shell::Zsh => write_script(shells::Zsh, &mut out),
        Shell::Fish => write_script(shells::Fish, &mut out),
        Shell::PowerShell => write_script(shells::PowerShell, &mut out),
    }
    out.flush()?;
    Ok(EXIT_OK)
}

fn write_script(generator: impl Generator, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(generator, &mut cmd, bin, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_names_the_binary() {
        let mut buf = Vec::new();
        write_script(shells::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("morpheus"));
        assert!(script.contains("routers"));
    }
}
