/// Login and registration handlers
use crate::error::IdentityError;
use crate::models::{LoginRequest, RegisterRequest};
use crate::services::AuthService;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// `POST /api/auth/login`
///
/// 200 with the token payload, or 401 with an empty body whether the email
/// is unknown or the password is wrong.
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, IdentityError> {
    match auth.login(&request.email, &request.password).await? {
        Some(response) => Ok((StatusCode::OK, Json(response)).into_response()),
        None => Ok(StatusCode::UNAUTHORIZED.into_response()),
    }
}

/// `POST /api/auth/register`
///
/// JSON boolean: `200 true` when the account was created, `400 false`
/// otherwise.
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let outcome = auth.register(&request.email, &request.password).await;

    if outcome.is_success() {
        (StatusCode::OK, Json(true)).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(false)).into_response()
    }
}
