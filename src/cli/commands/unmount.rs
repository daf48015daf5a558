//! `secrets-vault unmount`: encrypt the secrets folder and remove it.

use crate::cli::output;
use crate::cli::{display_path, open_vault};
use crate::errors::Result;
use crate::vault::UnmountOutcome;

/// Execute the `unmount` command.
pub fn execute(password: Option<&str>) -> Result<()> {
    let vault = open_vault(None, None)?;
    let ctx = vault.context();
    let dir = ctx.secrets_dir_name();

    match vault.unmount(password)? {
        UnmountOutcome::NotMounted => output::info(&format!("{dir}/ is not mounted.")),
        UnmountOutcome::Unchanged => {
            output::success(&format!("No changes in {dir}/; removed the plaintext folder."));
        }
        UnmountOutcome::Encrypted { files } => output::success(&format!(
            "Encrypted {files} file(s) into {}",
            display_path(ctx.secrets_file()).display()
        )),
        UnmountOutcome::EmptyDiscarded => {
            output::info(&format!("{dir}/ was empty and has been removed."));
        }
        UnmountOutcome::EmptyKept => {
            output::warning(&format!("{dir}/ is empty; nothing was encrypted."));
        }
    }

    Ok(())
}
