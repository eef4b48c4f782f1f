/// Identity Service Library
///
/// Issues bearer tokens for authenticated users, registers accounts and
/// announces new accounts to the rest of the platform.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: Credential store capability and its implementations
/// - `error`: Error types
/// - `http`: HTTP API (login, register, health)
/// - `models`: Data models
/// - `security`: Claims, JWT issuance, password hashing
/// - `services`: Auth engine and event publishers
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;

// Re-export commonly used types
pub use error::{IdentityError, Result};
pub use services::AuthService;
