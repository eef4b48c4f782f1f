/// Password hashing and verification using Argon2id
///
/// Used by the credential store implementations in this crate. The auth
/// engine itself never looks at passwords beyond handing them to the store.
use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id with a random per-password salt
///
/// ## Returns
///
/// PHC-formatted hash string safe for database storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
///
/// Constant-time comparison; `Ok(false)` on mismatch, `Err` only when the
/// stored hash itself is unusable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| IdentityError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Composition rules applied by the credential stores on account creation.
///
/// The defaults mirror the stock ASP.NET Identity policy so accounts created
/// by either stack are accepted by the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub required_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 6,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

impl PasswordPolicy {
    /// Returns `IdentityError::WeakPassword` naming the first failed rule
    pub fn validate(&self, password: &str) -> Result<()> {
        if password.chars().count() < self.required_length {
            return Err(IdentityError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.required_length
            )));
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(IdentityError::WeakPassword(
                "Password must contain at least one digit".to_string(),
            ));
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(IdentityError::WeakPassword(
                "Password must contain at least one lowercase letter".to_string(),
            ));
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(IdentityError::WeakPassword(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }

        if self.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentityError::WeakPassword(
                "Password must contain at least one non-alphanumeric character".to_string(),
            ));
        }

        Ok(())
    }
}
