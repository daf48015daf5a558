//! `secrets-vault destroy`: permanently delete everything for this vault.
//!
//! The user must type `DELETE` to proceed.  When stdin is not a terminal
//! the token is read as a plain line so scripts can confirm explicitly.

use std::io::{BufRead, IsTerminal};

use dialoguer::Input;

use crate::cli::output;
use crate::cli::open_vault;
use crate::errors::{Result, VaultError};
use crate::vault::{confirms_destroy, DestroyOutcome, DESTROY_CONFIRMATION};

/// Execute the `destroy` command.
pub fn execute() -> Result<()> {
    let vault = open_vault(None, None)?;

    output::warning(&format!(
        "This permanently deletes the encrypted vault, {}/, and the stored password for '{}'.",
        vault.context().secrets_dir_name(),
        vault.context().project_name()
    ));

    let token = read_confirmation()?;
    match vault.destroy(confirms_destroy(&token))? {
        DestroyOutcome::Cancelled => {
            output::info("Cancelled. Nothing was deleted.");
            Ok(())
        }
        DestroyOutcome::Destroyed(report) => {
            for item in &report.removed {
                output::success(&format!("Removed {item}"));
            }
            for (item, reason) in &report.failed {
                output::error(&format!("Could not remove {item}: {reason}"));
            }
            if report.removed.is_empty() && report.failed.is_empty() {
                output::info("Nothing to delete.");
            }
            if report.is_complete() {
                Ok(())
            } else {
                Err(VaultError::CommandFailed(format!(
                    "{} item(s) could not be removed",
                    report.failed.len()
                )))
            }
        }
    }
}

fn read_confirmation() -> Result<String> {
    let prompt = format!("Type {DESTROY_CONFIRMATION} to confirm");

    if std::io::stdin().is_terminal() {
        return Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")));
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
