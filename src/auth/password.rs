use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

/// Shortest password accepted at registration and on password change.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a new password with argon2 and a fresh salt. Passwords shorter than
/// [`MIN_PASSWORD_LEN`] characters are refused before hashing.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort { min: MIN_PASSWORD_LEN });
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash failed");
            PasswordError::Hash(e.to_string())
        })
}

/// Check a login attempt against a stored hash. A malformed stored hash is an
/// error, a mismatch is `Ok(false)`.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash unreadable");
        PasswordError::Hash(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(verify_password("Secur3P@ssw0rd!", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn short_password_is_refused_before_hashing() {
        let err = hash_password("short").unwrap_err();
        assert!(matches!(err, PasswordError::TooShort { min: MIN_PASSWORD_LEN }));
        // length counts characters, not bytes
        assert!(hash_password("ééééééé").is_err());
        assert!(hash_password("éééééééé").is_ok());
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "not-a-valid-hash"),
            Err(PasswordError::Hash(_))
        ));
    }
}
