//! AES-256-GCM authenticated encryption.
//!
//! Blobs are `[ 12-byte nonce | ciphertext + 16-byte auth tag ]`.  The
//! nonce is drawn from a `RandomSource`, so the vault encrypts with the
//! same source it draws salts from.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use super::random::{OsRandom, RandomSource};
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key` and an OS-random nonce.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with(&OsRandom, key, plaintext)
}

/// Encrypt `plaintext` with a nonce drawn from `random`.
///
/// Returns `nonce || ciphertext || tag`.
pub fn encrypt_with(random: &dyn RandomSource, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let mut output = vec![0u8; NONCE_LEN];
    random.fill_bytes(&mut output);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&output), plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
///
/// Expects the first 12 bytes to be the nonce, followed by the ciphertext.
pub fn decrypt(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < NONCE_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::DecryptionFailed)?;

    // Fails on a tag mismatch: wrong key, flipped bit, or truncation.
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::DecryptionFailed)
}
