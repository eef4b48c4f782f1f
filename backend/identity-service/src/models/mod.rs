/// Data models for identity and authentication
pub mod auth;
pub mod user;

pub use auth::{LoginRequest, LoginResponse, RegisterOutcome, RegisterRequest};
pub use user::{CreateUserOutcome, Identity, NewIdentity};
