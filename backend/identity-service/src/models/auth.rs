use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Successful login payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Same instant as the token's `exp` claim
    pub expiration_at_utc: DateTime<Utc>,
}

/// Registration result as decided by the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created { user_id: Uuid },
    Conflict(String),
    ValidationError(String),
    StoreError(String),
}

impl RegisterOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegisterOutcome::Created { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_wire_names() {
        let response = LoginResponse {
            token: "a.b.c".to_string(),
            expiration_at_utc: Utc::now(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["token"], "a.b.c");
        assert!(value.get("expirationAtUtc").is_some());
    }

    #[test]
    fn test_only_created_is_success() {
        assert!(RegisterOutcome::Created {
            user_id: Uuid::new_v4()
        }
        .is_success());
        assert!(!RegisterOutcome::Conflict("email".into()).is_success());
        assert!(!RegisterOutcome::ValidationError("password".into()).is_success());
        assert!(!RegisterOutcome::StoreError("down".into()).is_success());
    }
}
