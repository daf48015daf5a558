//! The vault state machine.
//!
//! A vault is either `Uninitialized` (nothing on disk), `Unmounted`
//! (archive only), `Mounted` (plaintext directory, archive optional) or
//! `Destroyed`.  Each public method is one CLI command: it checks the
//! current state, performs the transition, and reports what happened.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use super::context::VaultContext;
use super::interrupt::InterruptScope;
use super::outcome::{
    ArchiveInfo, CreateOutcome, DestroyOutcome, DestroyReport, DestroyedItem, MountReport,
    UnmountOutcome, VaultState, VaultStatus,
};
use crate::archive::format::entry_path;
use crate::archive::hasher::{self, TrackedFile, CHUNK_SIZE, HASH_MARKER};
use crate::archive::permissions::{read_permissions, restore_permissions, secure_directory};
use crate::archive::{with_backup, ArchiveEntry, ArchivePackage, BackupGuard};
use crate::config::ProjectConfig;
use crate::crypto::kdf::{DerivedKey, DEFAULT_ITERATIONS, SALT_LEN};
use crate::crypto::{decrypt, derive_key_with_iterations, encrypt_with, generate_salt, RandomSource};
use crate::errors::{Result, VaultError};

/// Guide file written into a freshly created secrets directory.
const README_NAME: &str = "README.txt";

const README_TEXT: &str = "\
Put your secret files here:
- .env files
- SSL certificates (.pem, .key)
- API keys
- Database passwords
- Any other sensitive files

When done, run: secrets-vault unmount
";

/// How a password was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasswordSource {
    Argument,
    Stored,
    Prompted,
}

/// One vault, driven through its lifecycle.
pub struct Vault {
    ctx: VaultContext,
    destroyed: Cell<bool>,
}

impl Vault {
    pub fn new(ctx: VaultContext) -> Self {
        Self {
            ctx,
            destroyed: Cell::new(false),
        }
    }

    pub fn context(&self) -> &VaultContext {
        &self.ctx
    }

    /// The current state, read from disk.
    pub fn state(&self) -> VaultState {
        if self.destroyed.get() {
            return VaultState::Destroyed;
        }
        let archived = self.ctx.secrets_file().is_file();
        if self.ctx.secrets_dir().exists() {
            VaultState::Mounted { archived }
        } else if archived {
            VaultState::Unmounted
        } else {
            VaultState::Uninitialized
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a new vault.
    ///
    /// Creates an empty secrets directory, or, when the directory already
    /// exists without an archive, encrypts it right away.  Never touches
    /// an existing archive.
    pub fn create(&self, password: Option<&str>) -> Result<CreateOutcome> {
        self.ensure_alive()?;
        let file = self.ctx.secrets_file();
        let dir = self.ctx.secrets_dir();

        if file.exists() {
            return Err(VaultError::AlreadyExists(file.to_path_buf()));
        }

        if dir.exists() {
            if !dir.is_dir() {
                return Err(VaultError::NotADirectory(dir.to_path_buf()));
            }
            let question = format!(
                "Found existing {}/ folder. Encrypt its contents?",
                self.ctx.secrets_dir_name()
            );
            if !self.ctx.prompt().confirm(&question)? {
                return Err(VaultError::Cancelled);
            }

            let password =
                self.password_or_prompt(password, "Enter password to encrypt secrets")?;
            let files = self.encrypt_directory(&password)?;
            fs::remove_dir_all(dir)?;
            let password_stored = self.remember_password(&password);
            self.save_project_config();

            info!(project = self.ctx.project_name(), files, "encrypted existing secrets folder");
            return Ok(CreateOutcome::EncryptedExisting {
                files,
                password_stored,
            });
        }

        fs::create_dir_all(dir)?;
        if let Err(e) = secure_directory(dir) {
            debug!(error = %e, "could not restrict secrets directory");
        }

        let password = match self.password_or_prompt(password, "Enter password for this project") {
            Ok(password) => password,
            Err(e) => {
                let _ = fs::remove_dir_all(dir);
                return Err(e);
            }
        };

        fs::write(dir.join(README_NAME), README_TEXT)?;
        let password_stored = self.remember_password(&password);
        self.save_project_config();

        info!(project = self.ctx.project_name(), "created secrets folder");
        Ok(CreateOutcome::Initialized { password_stored })
    }

    /// Decrypt the archive into the secrets directory.
    ///
    /// Mounting an already-mounted vault succeeds without doing anything.
    /// A wrong password or corrupted entry removes the partial directory
    /// and leaves the archive untouched.
    pub fn mount(&self, password: Option<&str>) -> Result<MountReport> {
        self.ensure_alive()?;
        let dir = self.ctx.secrets_dir();

        if dir.exists() {
            if !dir.is_dir() {
                return Err(VaultError::NotADirectory(dir.to_path_buf()));
            }
            return Ok(MountReport {
                files: self.current_files()?,
                already_mounted: true,
                password_stored: self.has_stored_password(),
            });
        }

        // Parse before creating anything, so format errors leave no trace.
        let package = ArchivePackage::read(self.ctx.secrets_file())?;
        let (password, source) = self.resolve_password(password)?;
        let files = self.extract(&package, &password)?;

        if let Err(e) = hasher::store_baseline(dir) {
            warn!(error = %e, "could not record secrets hash after mount");
        }

        let mut password_stored = self.has_stored_password();
        if source == PasswordSource::Prompted && !password_stored {
            let store = self
                .ctx
                .prompt()
                .confirm("Store password for future use?")
                .unwrap_or_else(|e| {
                    debug!(error = %e, "store-password prompt failed");
                    false
                });
            if store {
                password_stored = self.remember_password(&password);
            }
        }

        info!(project = self.ctx.project_name(), files = files.len(), "mounted secrets");
        Ok(MountReport {
            files,
            already_mounted: false,
            password_stored,
        })
    }

    /// Encrypt the secrets directory into the archive and remove it.
    ///
    /// If nothing changed since the last mount or unmount the archive is
    /// not rewritten, so version control sees no churn.
    pub fn unmount(&self, password: Option<&str>) -> Result<UnmountOutcome> {
        self.ensure_alive()?;
        let dir = self.ctx.secrets_dir();

        if !dir.exists() {
            return Ok(UnmountOutcome::NotMounted);
        }
        if !dir.is_dir() {
            return Err(VaultError::NotADirectory(dir.to_path_buf()));
        }

        let password = self.password_without_prompt(password)?;

        // Without an archive there is nothing to fall back on.
        if self.ctx.secrets_file().is_file() && !hasher::has_changed(dir) {
            fs::remove_dir_all(dir)?;
            info!(project = self.ctx.project_name(), "no changes detected, skipped re-encryption");
            return Ok(UnmountOutcome::Unchanged);
        }

        let files = hasher::tracked_files(dir, &[HASH_MARKER])?;
        if files.is_empty() {
            let question = format!(
                "No files found in {}/. Delete the empty folder?",
                self.ctx.secrets_dir_name()
            );
            if self.ctx.prompt().confirm(&question)? {
                fs::remove_dir_all(dir)?;
                return Ok(UnmountOutcome::EmptyDiscarded);
            }
            return Ok(UnmountOutcome::EmptyKept);
        }

        let count = self.seal(&password, &files)?;
        self.remember_password(&password);
        fs::remove_dir_all(dir)?;

        info!(project = self.ctx.project_name(), files = count, "unmounted secrets");
        Ok(UnmountOutcome::Encrypted { files: count })
    }

    /// Re-encrypt the archive under a new password.
    ///
    /// Requires the vault to be unmounted.  Both passwords are collected
    /// before any plaintext is written.  A wrong current password changes
    /// nothing; a failed re-encryption restores the archive and keeps the
    /// old stored password.
    pub fn change_password(&self, current: Option<&str>, new: Option<&str>) -> Result<usize> {
        self.ensure_alive()?;
        let dir = self.ctx.secrets_dir();

        if !self.ctx.secrets_file().is_file() {
            return Err(VaultError::ArchiveMissing(self.ctx.secrets_file().to_path_buf()));
        }
        if dir.exists() {
            return Err(VaultError::AlreadyMounted(dir.to_path_buf()));
        }

        let package = ArchivePackage::read(self.ctx.secrets_file())?;
        let (old_password, _) = self.resolve_password(current)?;
        let new_password = self.new_password(new)?;

        // The plaintext lives on disk from here until the folder is gone.
        let scope = self.ctx.interrupt().enter()?;
        self.extract(&package, &old_password)?;

        let count = match self.encrypt_directory(&new_password) {
            Ok(count) => count,
            Err(e) => {
                self.scrub_secrets_dir();
                return Err(e);
            }
        };

        // The archive now opens only with the new password.
        if let Err(e) = self.ctx.credentials().set(self.ctx.entry_name(), &new_password) {
            warn!(error = %e, "could not store new password");
        }
        fs::remove_dir_all(dir)?;
        drop(scope);

        info!(project = self.ctx.project_name(), files = count, "changed vault password");
        Ok(count)
    }

    /// Permanently delete the archive, secrets directory, stored password
    /// and project file.  Does nothing unless `confirmed`.
    pub fn destroy(&self, confirmed: bool) -> Result<DestroyOutcome> {
        self.ensure_alive()?;
        if !confirmed {
            info!(project = self.ctx.project_name(), "destroy cancelled");
            return Ok(DestroyOutcome::Cancelled);
        }

        let mut report = DestroyReport::default();
        let mut record = |item: DestroyedItem, result: Result<()>| match result {
            Ok(()) => report.removed.push(item),
            Err(e) => report.failed.push((item, e.to_string())),
        };

        let file = self.ctx.secrets_file();
        if file.exists() {
            record(
                DestroyedItem::Archive(file.to_path_buf()),
                fs::remove_file(file).map_err(VaultError::from),
            );
        }

        let backup = BackupGuard::backup_path(file);
        if backup.exists() {
            record(
                DestroyedItem::Backup(backup.clone()),
                fs::remove_file(&backup).map_err(VaultError::from),
            );
        }

        let config = ProjectConfig::path(self.ctx.root());
        if config.exists() {
            record(
                DestroyedItem::ProjectConfig(config),
                ProjectConfig::remove(self.ctx.root()).map(|_| ()),
            );
        }

        let dir = self.ctx.secrets_dir();
        if dir.exists() {
            let removal = if dir.is_dir() {
                fs::remove_dir_all(dir)
            } else {
                fs::remove_file(dir)
            };
            record(
                DestroyedItem::SecretsDir(dir.to_path_buf()),
                removal.map_err(VaultError::from),
            );
        }

        if self.has_stored_password() {
            record(
                DestroyedItem::Credential(self.ctx.entry_name().to_string()),
                self.ctx.credentials().delete(self.ctx.entry_name()),
            );
        }

        self.destroyed.set(true);
        info!(
            project = self.ctx.project_name(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "destroyed vault"
        );
        Ok(DestroyOutcome::Destroyed(report))
    }

    /// A read-only snapshot.  A corrupt archive is reported, not raised.
    pub fn status(&self) -> VaultStatus {
        let file = self.ctx.secrets_file();
        let dir = self.ctx.secrets_dir();
        let archive_exists = file.is_file();
        let mounted = dir.is_dir();

        let archive = if archive_exists {
            match ArchivePackage::read(file) {
                Ok(package) => ArchiveInfo::Parsed(package.summary()),
                Err(e) => ArchiveInfo::Unreadable {
                    error: e.to_string(),
                },
            }
        } else {
            ArchiveInfo::Missing
        };

        let current_file_count = mounted.then(|| {
            hasher::tracked_files(dir, &[HASH_MARKER])
                .map(|files| files.len())
                .unwrap_or(0)
        });

        VaultStatus {
            project: self.ctx.project_name().to_string(),
            secrets_dir: self.ctx.secrets_dir_name().to_string(),
            state: self.state(),
            archive_exists,
            mounted,
            current_file_count,
            password_stored: self.has_stored_password(),
            archive,
        }
    }

    // ------------------------------------------------------------------
    // Stored password
    // ------------------------------------------------------------------

    /// Store a password for this directory (prompting if none is given).
    pub fn store_password(&self, password: Option<&str>) -> Result<()> {
        self.ensure_alive()?;
        let prompt = format!("Enter password for project '{}'", self.ctx.project_name());
        let password = self.password_or_prompt(password, &prompt)?;
        self.ctx
            .credentials()
            .set(self.ctx.entry_name(), &password)?;
        info!(entry = self.ctx.entry_name(), "stored password");
        Ok(())
    }

    /// Remove the stored password.  Returns `false` if none was stored.
    pub fn clear_password(&self) -> Result<bool> {
        self.ensure_alive()?;
        if !self.has_stored_password() {
            return Ok(false);
        }
        self.ctx.credentials().delete(self.ctx.entry_name())?;
        info!(entry = self.ctx.entry_name(), "cleared stored password");
        Ok(true)
    }

    pub fn has_stored_password(&self) -> bool {
        self.ctx.credentials().has(self.ctx.entry_name())
    }

    /// Remove a partially mounted secrets directory.
    ///
    /// The rollback path for a failed or interrupted decryption.
    pub fn abort_mount(&self) -> Result<()> {
        let dir = self.ctx.secrets_dir();
        if !dir.exists() {
            return Ok(());
        }
        // Overwrite plaintext before unlinking; best effort only.
        if let Ok(files) = hasher::tracked_files(dir, &[]) {
            for file in files {
                if let Err(e) = overwrite_with_random(self.ctx.random(), &file.path) {
                    debug!(file = %file.relative, error = %e, "could not overwrite file");
                }
            }
        }
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed.get() {
            return Err(VaultError::Destroyed);
        }
        Ok(())
    }

    /// Decrypt every entry of `package` into the secrets directory.
    fn extract(&self, package: &ArchivePackage, password: &str) -> Result<Vec<String>> {
        let salt = &package.metadata.salt;
        if salt.len() != SALT_LEN {
            return Err(VaultError::FormatError(format!(
                "salt is {} bytes, expected {SALT_LEN}",
                salt.len()
            )));
        }
        let iterations = package.metadata.iterations.unwrap_or(DEFAULT_ITERATIONS);
        let key = derive_key_with_iterations(password.as_bytes(), salt, iterations)?;

        // Entered before the folder exists, so an interrupt either stops
        // us here or is seen between entries and rolled back.
        let scope = self.ctx.interrupt().enter()?;
        let dir = self.ctx.secrets_dir();
        fs::create_dir_all(dir)?;
        if let Err(e) = secure_directory(dir) {
            debug!(error = %e, "could not restrict secrets directory");
        }

        match self.extract_entries(package, &key, &scope) {
            Ok(files) => Ok(files),
            Err(e) => {
                if let Err(cleanup) = self.abort_mount() {
                    warn!(error = %cleanup, "could not remove partially mounted secrets");
                }
                Err(e)
            }
        }
    }

    fn extract_entries(
        &self,
        package: &ArchivePackage,
        key: &DerivedKey,
        scope: &InterruptScope<'_>,
    ) -> Result<Vec<String>> {
        let dir = self.ctx.secrets_dir();
        let mut files = Vec::with_capacity(package.files.len());

        for (relative, entry) in &package.files {
            scope.check()?;
            let path = entry_path(dir, relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut plaintext = decrypt(key.as_bytes(), &entry.content).map_err(|e| {
                warn!(file = %relative, "failed to decrypt file");
                e
            })?;
            let written = fs::write(&path, &plaintext);
            plaintext.zeroize();
            written?;

            if let Err(e) = restore_permissions(&path, &entry.permissions) {
                debug!(file = %relative, error = %e, "could not restore permissions");
            }
            files.push(relative.clone());
        }

        Ok(files)
    }

    /// Encrypt the secrets directory into the archive, whatever its hash.
    fn encrypt_directory(&self, password: &str) -> Result<usize> {
        let files = hasher::tracked_files(self.ctx.secrets_dir(), &[HASH_MARKER])?;
        if files.is_empty() {
            return Err(VaultError::EmptyVault);
        }
        self.seal(password, &files)
    }

    /// Encrypt `files` under a fresh salt and rewrite the archive.
    fn seal(&self, password: &str, files: &[TrackedFile]) -> Result<usize> {
        let salt = generate_salt(self.ctx.random());
        let iterations = self.ctx.iterations();
        let key = derive_key_with_iterations(password.as_bytes(), &salt, iterations)?;

        let scope = self.ctx.interrupt().enter()?;
        let mut entries = BTreeMap::new();
        for file in files {
            scope.check()?;
            let mut plaintext = fs::read(&file.path)?;
            let content = encrypt_with(self.ctx.random(), key.as_bytes(), &plaintext);
            plaintext.zeroize();

            entries.insert(
                file.relative.clone(),
                ArchiveEntry {
                    content: content?,
                    permissions: read_permissions(&file.path)?,
                },
            );
            debug!(file = %file.relative, "encrypted file");
        }

        let package = ArchivePackage::new(
            self.ctx.project_name(),
            self.ctx.clock().now(),
            &salt,
            iterations,
            entries,
        );
        scope.check()?;
        with_backup(self.ctx.secrets_file(), |path| package.write(path))?;
        drop(scope);

        if let Err(e) = hasher::store_baseline(self.ctx.secrets_dir()) {
            warn!(error = %e, "could not record secrets hash after encryption");
        }
        Ok(files.len())
    }

    /// Explicit password, then the credential store, then the prompt.
    fn resolve_password(&self, explicit: Option<&str>) -> Result<(Zeroizing<String>, PasswordSource)> {
        if let Some(password) = explicit {
            return non_empty(password).map(|p| (p, PasswordSource::Argument));
        }
        if let Some(password) = self.stored_password() {
            return Ok((password, PasswordSource::Stored));
        }
        let prompt = format!("Enter password for project '{}'", self.ctx.project_name());
        let password = self.ctx.prompt().read_secret(&prompt)?;
        non_empty(&password).map(|p| (p, PasswordSource::Prompted))
    }

    /// Explicit password or the credential store; never prompts.
    fn password_without_prompt(&self, explicit: Option<&str>) -> Result<Zeroizing<String>> {
        match explicit {
            Some(password) => non_empty(password),
            None => self.stored_password().ok_or(VaultError::NoPassword),
        }
    }

    /// Explicit password or the prompt; ignores the credential store.
    fn password_or_prompt(&self, explicit: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
        match explicit {
            Some(password) => non_empty(password),
            None => non_empty(&self.ctx.prompt().read_secret(prompt)?),
        }
    }

    /// The new password for `change_password`, confirmed when prompted.
    fn new_password(&self, explicit: Option<&str>) -> Result<Zeroizing<String>> {
        if let Some(password) = explicit {
            return non_empty(password);
        }
        let password = non_empty(&self.ctx.prompt().read_secret("Enter new password")?)?;
        let confirmation = self.ctx.prompt().read_secret("Confirm new password")?;
        if *password != *confirmation {
            return Err(VaultError::PasswordMismatch);
        }
        Ok(password)
    }

    fn stored_password(&self) -> Option<Zeroizing<String>> {
        match self.ctx.credentials().get(self.ctx.entry_name()) {
            Ok(Some(password)) if !password.is_empty() => Some(password),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "could not read stored password");
                None
            }
        }
    }

    /// Store `password`; failures are logged, not raised.
    fn remember_password(&self, password: &str) -> bool {
        match self.ctx.credentials().set(self.ctx.entry_name(), password) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "could not store password");
                false
            }
        }
    }

    fn save_project_config(&self) {
        let config = ProjectConfig {
            entry_name: self.ctx.entry_name().to_string(),
            project_name: Some(self.ctx.project_name().to_string()),
            secrets_dir: Some(self.ctx.secrets_dir_name().to_string()),
        };
        if let Err(e) = config.save(self.ctx.root()) {
            warn!(error = %e, "could not save project config");
        }
    }

    fn scrub_secrets_dir(&self) {
        if let Err(e) = self.abort_mount() {
            warn!(error = %e, "could not remove mounted secrets");
        }
    }

    fn current_files(&self) -> Result<Vec<String>> {
        Ok(hasher::tracked_files(self.ctx.secrets_dir(), &[HASH_MARKER])?
            .into_iter()
            .map(|f| f.relative)
            .collect())
    }
}

fn non_empty(password: &str) -> Result<Zeroizing<String>> {
    if password.is_empty() {
        return Err(VaultError::NoPassword);
    }
    Ok(Zeroizing::new(password.to_string()))
}

/// Overwrite `path` in place with random bytes, chunk by chunk.
/// Symlinks are left alone so nothing outside the folder is touched.
fn overwrite_with_random(random: &dyn RandomSource, path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if !meta.is_file() {
        return Ok(());
    }

    let mut remaining = meta.len();
    let mut noise = vec![0u8; CHUNK_SIZE];
    let mut handle = fs::OpenOptions::new().write(true).open(path)?;
    while remaining > 0 {
        let n = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        random.fill_bytes(&mut noise[..n]);
        handle.write_all(&noise[..n])?;
        remaining -= n as u64;
    }
    handle.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OsRandom;
    use tempfile::TempDir;

    #[test]
    fn overwrite_spans_several_chunks_and_keeps_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let original = vec![0u8; CHUNK_SIZE * 2 + 17];
        fs::write(&path, &original).unwrap();

        overwrite_with_random(&OsRandom, &path).unwrap();

        let scrubbed = fs::read(&path).unwrap();
        assert_eq!(scrubbed.len(), original.len());
        assert_ne!(&scrubbed[..CHUNK_SIZE], &original[..CHUNK_SIZE]);
        assert_ne!(&scrubbed[CHUNK_SIZE * 2..], &original[CHUNK_SIZE * 2..]);
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_leaves_symlink_targets_alone() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.key");
        fs::write(&target, b"keep me").unwrap();
        let link = dir.path().join("link.key");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        overwrite_with_random(&OsRandom, &link).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"keep me");
    }
}
