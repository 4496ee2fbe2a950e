//! `pathwayctl completion <shell> [--output FILE]`

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::cli::Cli;

pub fn execute(shell: Shell, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_completions(shell, &mut file);
            tracing::info!("Wrote {} completions to {}", shell, path.display());
        }
        None => write_completions(shell, &mut io::stdout()),
    }
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_completions(shell, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_completions_cover_subcommands() {
        let script = render(Shell::Bash);
        assert!(script.contains("pathwayctl"));
        for sub in ["list", "show", "templates", "save", "validate"] {
            assert!(script.contains(sub), "missing {}", sub);
        }
    }

    #[test]
    fn test_every_shell_renders() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            assert!(!render(shell).is_empty());
        }
    }
}
