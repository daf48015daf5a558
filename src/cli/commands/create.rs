//! `secrets-vault create`: start a vault in the current directory.

use crate::cli::output;
use crate::cli::{display_path, open_vault, protect_from_git};
use crate::errors::Result;
use crate::vault::CreateOutcome;

/// Execute the `create` command.
pub fn execute(
    project: Option<&str>,
    secrets_dir: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    let vault = open_vault(project, secrets_dir)?;
    let ctx = vault.context();

    let outcome = vault.create(password)?;
    protect_from_git(&vault);

    let archive = display_path(ctx.secrets_file());
    match outcome {
        CreateOutcome::Initialized { password_stored } => {
            output::success(&format!(
                "Created {}/ for project '{}'",
                ctx.secrets_dir_name(),
                ctx.project_name()
            ));
            if password_stored {
                output::info("Password stored for future use.");
            }
            output::tip(&format!(
                "Put your secret files in {}/, then run `secrets-vault unmount`.",
                ctx.secrets_dir_name()
            ));
        }
        CreateOutcome::EncryptedExisting {
            files,
            password_stored,
        } => {
            output::success(&format!(
                "Encrypted {files} file(s) into {}",
                archive.display()
            ));
            if password_stored {
                output::info("Password stored for future use.");
            }
            output::tip("Run `secrets-vault mount` to work on your secrets again.");
        }
    }

    Ok(())
}
