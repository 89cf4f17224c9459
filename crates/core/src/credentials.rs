//! Password hashing for patient and doctor accounts.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$...`) with a random salt per hash.

use crate::constants::MIN_PASSWORD_LEN;
use crate::error::{BookingError, BookingResult};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn validate_password_strength(password: &str) -> BookingResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BookingError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hashes `password` after checking its strength.
pub fn hash_password(password: &str) -> BookingResult<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BookingError::PasswordHash(e.to_string()))
}

/// Checks `password` against a stored PHC hash. A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {}", e);
            false
        }
    }
}
