use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString, rand_core::OsRng};

use crate::error::AppError;

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Str0ng#Pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Str0ng#Pass", &hash));
        assert!(!verify_password("str0ng#pass", &hash));
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash_password("Same#123").unwrap(), hash_password("Same#123").unwrap());
    }

    #[test]
    fn garbage_hash_is_rejected() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }
}
