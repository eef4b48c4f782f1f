/// Credential store capability
///
/// The auth engine only talks to accounts through [`CredentialStore`]; hashing,
/// uniqueness and validation policy live behind it.
pub mod memory;
pub mod users;

pub use memory::InMemoryCredentialStore;
pub use users::PgCredentialStore;

use crate::error::Result;
use crate::models::{CreateUserOutcome, Identity, NewIdentity};
use crate::security::PasswordPolicy;
use async_trait::async_trait;

/// Characters accepted in usernames
const ALLOWED_USERNAME_CHARACTERS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._@+";

/// Account rules shared by every store. Returns the reason for the first
/// rule broken, which the store reports as `CreateUserOutcome::Rejected`.
pub fn validate_new_account(
    new_identity: &NewIdentity,
    password: &str,
    policy: &PasswordPolicy,
) -> Option<String> {
    if new_identity.username.trim().is_empty() {
        return Some("Username must not be empty".to_string());
    }
    if let Some(bad) = new_identity
        .username
        .chars()
        .find(|c| !ALLOWED_USERNAME_CHARACTERS.contains(*c))
    {
        return Some(format!("Username contains invalid character '{}'", bad));
    }
    if !new_identity.email.contains('@') {
        return Some("Email is not valid".to_string());
    }
    if let Err(err) = policy.validate(password) {
        return Some(err.to_string());
    }
    None
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// `Ok(false)` on mismatch; `Err` only when the store cannot answer
    async fn check_password(&self, identity: &Identity, password: &str) -> Result<bool>;

    /// Role names in assignment order
    async fn roles(&self, identity: &Identity) -> Result<Vec<String>>;

    /// Create an account; refusals come back as `Ok(Conflict | Rejected)`,
    /// store failures as `Err`.
    async fn create(&self, new_identity: NewIdentity, password: &str)
        -> Result<CreateUserOutcome>;
}
