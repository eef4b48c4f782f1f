/// Claim set embedded in every access token
use crate::models::Identity;
use serde::{Deserialize, Serialize};

/// Role claim value for accounts without any role assignment
pub const NO_ROLE: &str = "NoRole";

/// Payload names understood by `JwtSecurityTokenHandler`-style verifiers
pub mod names {
    pub const NAME: &str = "unique_name";
    pub const EMAIL: &str = "email";
    pub const NAME_IDENTIFIER: &str = "nameid";
    pub const ROLE: &str = "role";
}

/// Exactly four claims: name, email, identifier and a single role.
///
/// Built once from an identity snapshot and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(rename = "unique_name")]
    name: String,
    email: String,
    #[serde(rename = "nameid")]
    identifier: String,
    role: String,
}

impl ClaimSet {
    /// Only the first assigned role is used.
    pub fn from_identity(identity: &Identity, roles: &[String]) -> Self {
        Self {
            name: identity.username.clone(),
            email: identity.email.clone(),
            identifier: identity.id.to_string(),
            role: roles
                .first()
                .cloned()
                .unwrap_or_else(|| NO_ROLE.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Claims in issuance order
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            (names::NAME, self.name.as_str()),
            (names::EMAIL, self.email.as_str()),
            (names::NAME_IDENTIFIER, self.identifier.as_str()),
            (names::ROLE, self.role.as_str()),
        ]
    }
}
