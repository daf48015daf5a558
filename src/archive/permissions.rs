//! POSIX permission bits recorded alongside each encrypted file.
//!
//! On Unix the low nine mode bits are stored as a three-digit octal
//! string.  Elsewhere `DEFAULT_PERMISSIONS` is recorded and restoring is
//! a no-op.

use std::fs;
use std::path::Path;

use crate::errors::{Result, VaultError};

/// Permission string recorded when the platform has no mode bits.
pub const DEFAULT_PERMISSIONS: &str = "644";

/// Read the permission string for `path`.
#[cfg(unix)]
pub fn read_permissions(path: &Path) -> Result<String> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    Ok(format!("{:03o}", mode & 0o777))
}

#[cfg(not(unix))]
pub fn read_permissions(_path: &Path) -> Result<String> {
    Ok(DEFAULT_PERMISSIONS.to_string())
}

/// Parse a stored permission string into mode bits.
pub fn parse_permissions(octal: &str) -> Result<u32> {
    if octal.len() != 3 {
        return Err(VaultError::FormatError(format!(
            "permissions '{octal}' must be three octal digits"
        )));
    }
    u32::from_str_radix(octal, 8)
        .map_err(|_| VaultError::FormatError(format!("permissions '{octal}' are not octal")))
}

/// Apply a stored permission string to `path`.
#[cfg(unix)]
pub fn restore_permissions(path: &Path, octal: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = parse_permissions(octal)?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn restore_permissions(_path: &Path, octal: &str) -> Result<()> {
    parse_permissions(octal).map(|_| ())
}

/// Restrict a directory to its owner (`rwx------`).
#[cfg(unix)]
pub fn secure_directory(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn secure_directory(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_octal_strings() {
        assert_eq!(parse_permissions("644").unwrap(), 0o644);
        assert_eq!(parse_permissions("600").unwrap(), 0o600);
        assert!(parse_permissions("9").is_err());
        assert!(parse_permissions("789").is_err());
        assert!(parse_permissions("0644").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_roundtrip_on_unix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.pem");
        fs::write(&path, b"-----BEGIN-----").unwrap();

        restore_permissions(&path, "640").unwrap();
        assert_eq!(read_permissions(&path).unwrap(), "640");
    }

    #[cfg(unix)]
    #[test]
    fn secured_directory_is_owner_only() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("secrets");
        fs::create_dir(&target).unwrap();

        secure_directory(&target).unwrap();
        assert_eq!(read_permissions(&target).unwrap(), "700");
    }
}
