use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account as seen by the auth engine.
///
/// Owned by the credential store; the engine only holds it for the duration
/// of a request. Password material never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Account data submitted to the store on registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
}

impl NewIdentity {
    /// Builds the registration record, deriving the username from the local
    /// part of the email (everything before the first `@`).
    pub fn from_email(email: &str) -> Self {
        Self {
            username: default_username(email).to_string(),
            email: email.to_string(),
        }
    }
}

pub fn default_username(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

/// Result of asking the credential store to create an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created(Identity),
    /// Uniqueness policy refused the account (field name in the message)
    Conflict(String),
    /// Store-side validation refused the account
    Rejected(String),
}
