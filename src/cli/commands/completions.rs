//! `secrets-vault completions`: print a shell completion script.
//!
//!   secrets-vault completions bash > ~/.local/share/bash-completion/completions/secrets-vault
//!   secrets-vault completions zsh > "${fpath[1]}/_secrets-vault"

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{Result, VaultError};

const BIN_NAME: &str = "secrets-vault";

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell = parse_shell(shell)?;
    generate(shell, &mut Cli::command(), BIN_NAME, &mut io::stdout());
    Ok(())
}

fn parse_shell(name: &str) -> Result<Shell> {
    let shell = match name.trim().to_ascii_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" | "pwsh" | "ps" => Shell::PowerShell,
        other => {
            return Err(VaultError::CommandFailed(format!(
                "unknown shell '{other}' (expected bash, zsh, fish, elvish or powershell)"
            )))
        }
    };
    Ok(shell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shells_parse() {
        assert_eq!(parse_shell("bash").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("Zsh").unwrap(), Shell::Zsh);
        assert_eq!(parse_shell("fish").unwrap(), Shell::Fish);
        assert_eq!(parse_shell("pwsh").unwrap(), Shell::PowerShell);
    }

    #[test]
    fn unknown_shell_fails() {
        assert!(parse_shell("tcsh").is_err());
        assert!(parse_shell("").is_err());
    }
}
