//! `secrets-vault mount`: decrypt the vault into the secrets folder.

use crate::cli::output;
use crate::cli::{open_vault, protect_from_git};
use crate::errors::Result;
use crate::vault::VaultState;

/// Execute the `mount` command.
pub fn execute(password: Option<&str>) -> Result<()> {
    let vault = open_vault(None, None)?;
    let ctx = vault.context();

    let was_mounted = matches!(vault.state(), VaultState::Mounted { .. });
    let report = match vault.mount(password) {
        Ok(report) => report,
        Err(e) => {
            // Never leave a half-written plaintext folder behind.
            if !was_mounted && ctx.secrets_dir().exists() {
                vault.abort_mount()?;
            }
            return Err(e);
        }
    };
    protect_from_git(&vault);

    if report.already_mounted {
        output::info(&format!(
            "{}/ is already mounted ({} file(s))",
            ctx.secrets_dir_name(),
            report.files.len()
        ));
        return Ok(());
    }

    output::success(&format!(
        "Decrypted {} file(s) into {}/",
        report.files.len(),
        ctx.secrets_dir_name()
    ));
    output::file_list(&report.files);
    if !report.password_stored {
        output::tip("Run `secrets-vault pass` to store the password.");
    }
    output::tip("Run `secrets-vault unmount` when you are done.");

    Ok(())
}
