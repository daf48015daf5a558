//! `secrets-vault status`: show the vault's state without changing it.

use crate::cli::open_vault;
use crate::cli::output;
use crate::errors::{Result, VaultError};

/// Execute the `status` command.
pub fn execute(json: bool) -> Result<()> {
    let vault = open_vault(None, None)?;
    let status = vault.status();

    if json {
        let text = serde_json::to_string_pretty(&status)
            .map_err(|e| VaultError::SerializationError(format!("status: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    output::print_status_table(&status);
    if !status.archive_exists && !status.mounted {
        output::tip("Run `secrets-vault create` to start a vault here.");
    }
    Ok(())
}
