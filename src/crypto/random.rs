//! Injectable randomness for salts.
//!
//! The vault draws salts through `RandomSource` so tests can pin them;
//! production code uses `OsRandom`, backed by the thread-local CSPRNG.

use rand::RngCore;

use super::kdf::SALT_LEN;

/// A source of cryptographically secure random bytes.
pub trait RandomSource {
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// The default random source (`rand::rng()`, reseeded from the OS).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        rand::rng().fill_bytes(dest);
    }
}

/// Generate a fresh 32-byte salt from `source`.
pub fn generate_salt(source: &dyn RandomSource) -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    source.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_salts_are_fresh() {
        let a = generate_salt(&OsRandom);
        let b = generate_salt(&OsRandom);
        assert_ne!(a, b);
    }
}
