/// Security module for authentication
///
/// Provides core security primitives for identity-service:
/// - Claim set construction from an identity snapshot
/// - JWT issuance and validation (HS256)
/// - Password hashing and verification (Argon2id) plus the default password policy
pub mod claims;
pub mod password;
pub mod token;

pub use claims::{ClaimSet, NO_ROLE};
pub use password::{hash_password, verify_password, PasswordPolicy};
pub use token::{IssuedToken, TokenClaims, TokenIssuer};
