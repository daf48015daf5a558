//! Integration tests for the secrets-vault crypto module.

use secrets_vault::crypto::encryption::{NONCE_LEN, TAG_LEN};
use secrets_vault::crypto::kdf::{MIN_ITERATIONS, SALT_LEN};
use secrets_vault::crypto::{
    decrypt, derive_key, derive_key_with_iterations, encrypt, generate_salt, OsRandom,
    RandomSource,
};
use secrets_vault::errors::VaultError;

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = b"DATABASE_URL=postgres://localhost/mydb";

    let ciphertext = encrypt(&key, plaintext).expect("encrypt should succeed");
    assert_eq!(ciphertext.len(), NONCE_LEN + plaintext.len() + TAG_LEN);

    let recovered = decrypt(&key, &ciphertext).expect("decrypt should succeed");
    assert_eq!(recovered, plaintext);
}

#[test]
fn empty_plaintext_roundtrips() {
    let key = [0x01u8; 32];
    let ciphertext = encrypt(&key, b"").unwrap();
    assert_eq!(ciphertext.len(), NONCE_LEN + TAG_LEN);
    assert!(decrypt(&key, &ciphertext).unwrap().is_empty());
}

#[test]
fn encrypt_uses_a_fresh_nonce_each_time() {
    let key = [0xCDu8; 32];
    let ct1 = encrypt(&key, b"SECRET=hello").unwrap();
    let ct2 = encrypt(&key, b"SECRET=hello").unwrap();

    assert_ne!(ct1[..NONCE_LEN], ct2[..NONCE_LEN]);
    assert_ne!(ct1, ct2);
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let ciphertext = encrypt(&[0x11u8; 32], b"TOP_SECRET=42").unwrap();
    let result = decrypt(&[0x22u8; 32], &ciphertext);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

#[test]
fn any_flipped_byte_is_detected() {
    let key = [0x33u8; 32];
    let ciphertext = encrypt(&key, b"API_KEY=abc123").unwrap();

    for i in 0..ciphertext.len() {
        let mut tampered = ciphertext.clone();
        tampered[i] ^= 0x01;
        assert!(
            matches!(decrypt(&key, &tampered), Err(VaultError::DecryptionFailed)),
            "flipping byte {i} went unnoticed"
        );
    }
}

#[test]
fn blob_shorter_than_nonce_and_tag_fails() {
    let key = [0xAAu8; 32];
    let result = decrypt(&key, &[0u8; NONCE_LEN + TAG_LEN - 1]);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

#[test]
fn encrypt_rejects_short_key() {
    let result = encrypt(&[0u8; 16], b"data");
    assert!(matches!(result, Err(VaultError::EncryptionFailed(_))));
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derivation_is_deterministic() {
    let salt = [7u8; SALT_LEN];
    let a = derive_key(b"hunter2", &salt).unwrap();
    let b = derive_key(b"hunter2", &salt).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn salt_and_password_both_matter() {
    let salt = [7u8; SALT_LEN];
    let other_salt = [8u8; SALT_LEN];
    let base = derive_key(b"hunter2", &salt).unwrap();

    assert_ne!(base.as_bytes(), derive_key(b"hunter3", &salt).unwrap().as_bytes());
    assert_ne!(base.as_bytes(), derive_key(b"hunter2", &other_salt).unwrap().as_bytes());
}

#[test]
fn iteration_count_changes_the_key() {
    let salt = [9u8; SALT_LEN];
    let a = derive_key_with_iterations(b"pw", &salt, MIN_ITERATIONS).unwrap();
    let b = derive_key_with_iterations(b"pw", &salt, MIN_ITERATIONS + 1).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn weak_iteration_count_is_refused() {
    let result = derive_key_with_iterations(b"pw", &[0u8; SALT_LEN], MIN_ITERATIONS - 1);
    assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
}

#[test]
fn wrong_salt_length_is_refused() {
    let result = derive_key(b"pw", &[0u8; 16]);
    assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
}

#[test]
fn derived_key_decrypts_what_it_encrypted() {
    let salt = generate_salt(&OsRandom);
    let key = derive_key(b"correct horse", &salt).unwrap();
    let ciphertext = encrypt(key.as_bytes(), b"PORT=8080").unwrap();

    let again = derive_key(b"correct horse", &salt).unwrap();
    assert_eq!(decrypt(again.as_bytes(), &ciphertext).unwrap(), b"PORT=8080");
}

// ---------------------------------------------------------------------------
// Salt generation
// ---------------------------------------------------------------------------

struct Counting;

impl RandomSource for Counting {
    fn fill_bytes(&self, dest: &mut [u8]) {
        for (i, b) in dest.iter_mut().enumerate() {
            *b = i as u8;
        }
    }
}

#[test]
fn salt_comes_from_the_given_source() {
    let salt = generate_salt(&Counting);
    assert_eq!(salt.len(), SALT_LEN);
    assert_eq!(salt[0], 0);
    assert_eq!(salt[31], 31);
}

#[test]
fn os_salts_differ() {
    assert_ne!(generate_salt(&OsRandom), generate_salt(&OsRandom));
}
