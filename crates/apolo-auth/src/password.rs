//! Password hashing and verification using Argon2
//!
//! Backs the `*password` attribute type: literals are hashed with Argon2id
//! and stored in PHC string format, which embeds the salt and parameters so
//! any instance can verify them later.

use apolo_core::error::AppError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use tracing::{debug, error};

/// PHC identifiers produced by Argon2
const ARGON2_IDENTS: [&str; 3] = ["argon2id", "argon2i", "argon2d"];

/// Password hashing service using Argon2
///
/// Uses Argon2id with default parameters.
#[derive(Debug, Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hash a password using Argon2
    ///
    /// Every call uses a fresh random salt, so hashing the same value twice
    /// gives different strings that both verify.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHash` if hashing fails
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        debug!("Hashing password");

        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                AppError::PasswordHash(format!("Password hashing failed: {}", e))
            })?;

        Ok(password_hash.to_string())
    }

    /// Verify a password against a hash
    ///
    /// Returns `Ok(false)` on mismatch and an error when `hash` is not a
    /// valid PHC string.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        debug!("Verifying password");

        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "Failed to parse password hash");
            AppError::PasswordHash(format!("Invalid password hash format: {}", e))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => {
                error!(error = %e, "Password verification error");
                Err(AppError::PasswordHash(format!(
                    "Password verification failed: {}",
                    e
                )))
            }
        }
    }

    /// Whether `value` already is an Argon2 PHC hash
    ///
    /// Used to keep the stored-directive rewrite from hashing twice.
    pub fn is_hash(&self, value: &str) -> bool {
        PasswordHash::new(value)
            .map(|h| ARGON2_IDENTS.contains(&h.algorithm.as_str()))
            .unwrap_or(false)
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let service = PasswordService::new();
        let hash = service.hash_password("CGRateS.org").unwrap();

        assert!(!hash.is_empty());
        assert!(hash.starts_with("$argon2id"));
    }

    #[test]
    fn test_verify_correct_password() {
        let service = PasswordService::new();
        let hash = service.hash_password("CGRateS.org").unwrap();

        assert!(service.verify_password("CGRateS.org", &hash).unwrap());
        assert!(!service.verify_password("CGRateS.com", &hash).unwrap());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let service = PasswordService::new();

        let hash1 = service.hash_password("same_password").unwrap();
        let hash2 = service.hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(service.verify_password("same_password", &hash1).unwrap());
        assert!(service.verify_password("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let service = PasswordService::new();
        let result = service.verify_password("password", "not_a_valid_hash");

        assert!(matches!(result, Err(AppError::PasswordHash(_))));
    }

    #[test]
    fn test_is_hash() {
        let service = PasswordService::new();
        let hash = service.hash_password("secret").unwrap();

        assert!(service.is_hash(&hash));
        assert!(!service.is_hash("secret"));
        assert!(!service.is_hash(""));
        assert!(!service.is_hash("$pbkdf2-sha256$i=1000$c2FsdA$aGFzaA"));
    }

    #[test]
    fn test_special_characters() {
        let service = PasswordService::new();
        let password = "p@ss;w0rd`~*req.Account";
        let hash = service.hash_password(password).unwrap();

        assert!(service.verify_password(password, &hash).unwrap());
    }
}
