//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
//! so the parameters travel with each record.
//!
//! Both functions are CPU bound; async callers should run them on the
//! blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params};

use crate::{CoreError, CoreResult};

const SALT_LEN: usize = 16;

pub fn hash_password(password: &str) -> CoreResult<String> {
    hash_with(&Argon2::default(), password)
}

/// Hashes with explicit cost parameters.
pub fn hash_password_with_params(password: &str, params: Params) -> CoreResult<String> {
    let hasher = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    hash_with(&hasher, password)
}

fn hash_with(hasher: &Argon2<'_>, password: &str) -> CoreResult<String> {
    let salt_bytes: [u8; SALT_LEN] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CoreError::IdentityError(format!("salt encoding failed: {}", e)))?;

    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::IdentityError(format!("password hashing failed: {}", e)))
}

/// Checks `password` against a stored PHC string.
///
/// A malformed stored value is an error rather than a mismatch so that
/// corrupted records show up in the logs.
pub fn verify_password(password: &str, stored: &str) -> CoreResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| CoreError::IdentityError(format!("malformed password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CoreError::IdentityError(format!(
            "password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Params {
        Params::new(256, 1, 1, None).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password_with_params("123456789", cheap()).unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("123456789", &stored).unwrap());
        assert!(!verify_password("12345678", &stored).unwrap());
    }

    #[test]
    fn test_default_parameters_round_trip() {
        let stored = hash_password("secret").unwrap();
        assert!(verify_password("secret", &stored).unwrap());
    }

    #[test]
    fn test_salt_makes_hashes_differ() {
        let a = hash_password_with_params("secret", cheap()).unwrap();
        let b = hash_password_with_params("secret", cheap()).unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret", &a).unwrap());
        assert!(verify_password("secret", &b).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("x", "plaintext").is_err());
        assert!(verify_password("x", "sha256$1$00$00").is_err());
    }
}
