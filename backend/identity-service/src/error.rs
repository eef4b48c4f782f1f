use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Event publish error: {0}")]
    EventPublish(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::InvalidToken | IdentityError::TokenExpired => StatusCode::UNAUTHORIZED,
            IdentityError::WeakPassword(_) | IdentityError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            IdentityError::Configuration(_)
            | IdentityError::Database(_)
            | IdentityError::JwtError(_)
            | IdentityError::EventPublish(_)
            | IdentityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients
    pub fn public_message(&self) -> String {
        match self {
            IdentityError::InvalidToken | IdentityError::TokenExpired => {
                "Invalid or expired token".to_string()
            }
            IdentityError::Configuration(_)
            | IdentityError::Database(_)
            | IdentityError::JwtError(_)
            | IdentityError::EventPublish(_)
            | IdentityError::Internal(_) => {
                // Don't leak internal details
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

// Conversions from external error types
impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        IdentityError::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::error!("JWT error: {}", err);
        IdentityError::JwtError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = IdentityError::Database("connection refused to 10.0.0.3".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = IdentityError::WeakPassword("needs a digit".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Password too weak: needs a digit");
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        assert_eq!(
            IdentityError::TokenExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IdentityError::InvalidToken.public_message(),
            IdentityError::TokenExpired.public_message()
        );
    }
}
