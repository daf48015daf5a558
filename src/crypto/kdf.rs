//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! Every archive write draws a fresh 32-byte salt, so the same password
//! yields an unrelated key for each archive version.  The iteration count
//! is configurable (see `Settings`) but never drops below
//! `MIN_ITERATIONS`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum accepted PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Iteration count used when nothing else is configured.
pub const DEFAULT_ITERATIONS: u32 = MIN_ITERATIONS;

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Access the raw key bytes (e.g. to pass to `encrypt`).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Derive a key with the default iteration count.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    derive_key_with_iterations(password, salt, DEFAULT_ITERATIONS)
}

/// Derive a 32-byte key from `password` and a 32-byte `salt`.
///
/// The same password + salt + iterations always produce the same key.
pub fn derive_key_with_iterations(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<DerivedKey> {
    if iterations < MIN_ITERATIONS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {iterations})"
        )));
    }
    if salt.len() != SALT_LEN {
        return Err(VaultError::KeyDerivationFailed(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let mut bytes = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut bytes);
    Ok(DerivedKey { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let salt = [3u8; SALT_LEN];
        let a = derive_key(b"p@ss", &salt).unwrap();
        let b = derive_key(b"p@ss", &salt).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_give_different_keys() {
        let a = derive_key(b"p@ss", &[1u8; SALT_LEN]).unwrap();
        let b = derive_key(b"p@ss", &[2u8; SALT_LEN]).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn weak_iteration_count_is_rejected() {
        let result = derive_key_with_iterations(b"pw", &[0u8; SALT_LEN], 1_000);
        assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
    }

    #[test]
    fn wrong_salt_length_is_rejected() {
        let result = derive_key(b"pw", &[0u8; 16]);
        assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
    }
}
