use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use lazy_static::lazy_static;

use crate::storage::StorageError;

lazy_static! {
    /// Passwords that pass the structural checks but are still too
    /// guessable to accept.
    static ref COMMON_PASSWORDS: Vec<&'static str> = vec![
        "password1", "passw0rd", "qwerty123", "abc123", "letmein1",
        "welcome1", "admin123", "iloveyou2", "dragon123", "monkey12",
        "123456a", "a123456",
    ];
}

pub fn validate_password_strength(password: &str) -> Result<(), StorageError> {
    if password.len() < 6 {
        return Err(StorageError::WeakPassword(
            "password must be at least 6 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(StorageError::WeakPassword(
            "password must contain at least one letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(StorageError::WeakPassword(
            "password must contain at least one digit",
        ));
    }
    let lowered = password.to_ascii_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(StorageError::WeakPassword("password is too common"));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, StorageError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| anyhow::anyhow!("Failed to hash password: {}", error).into())
}

/// Constant-time verification against a stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(error) => {
            log::error!("Stored password hash is unparseable: {}", error);
            false
        }
    }
}
