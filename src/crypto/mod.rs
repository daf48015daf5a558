//! Cryptographic primitives for secrets-vault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - The injectable salt source (`random`)

pub mod encryption;
pub mod kdf;
pub mod random;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, encrypt_with};
pub use kdf::{derive_key, derive_key_with_iterations, DerivedKey};
pub use random::{generate_salt, OsRandom, RandomSource};
