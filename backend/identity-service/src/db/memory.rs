/// In-memory credential store
///
/// Backs development runs without a database and the test suites. Uniqueness
/// is checked here; the account rules come from [`validate_new_account`].
use crate::db::{validate_new_account, CredentialStore};
use crate::error::{IdentityError, Result};
use crate::models::{CreateUserOutcome, Identity, NewIdentity};
use crate::security::{hash_password, verify_password, PasswordPolicy};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredUser {
    identity: Identity,
    password_hash: String,
    roles: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    /// Keyed by normalized email
    users: DashMap<String, StoredUser>,
    /// Normalized username -> account id
    usernames: DashMap<String, Uuid>,
    policy: PasswordPolicy,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PasswordPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Append a role to an existing account
    pub fn add_role(&self, email: &str, role: &str) -> Result<()> {
        let mut user = self.users.get_mut(&normalize(email)).ok_or_else(|| {
            IdentityError::Validation(format!("No account registered for {}", email))
        })?;
        if !user.roles.iter().any(|existing| existing == role) {
            user.roles.push(role.to_string());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self
            .users
            .get(&normalize(email))
            .map(|user| user.identity.clone()))
    }

    async fn check_password(&self, identity: &Identity, password: &str) -> Result<bool> {
        let Some(password_hash) = self
            .users
            .get(&normalize(&identity.email))
            .filter(|user| user.identity.id == identity.id)
            .map(|user| user.password_hash.clone())
        else {
            return Ok(false);
        };

        verify_password(password, &password_hash)
    }

    async fn roles(&self, identity: &Identity) -> Result<Vec<String>> {
        Ok(self
            .users
            .get(&normalize(&identity.email))
            .filter(|user| user.identity.id == identity.id)
            .map(|user| user.roles.clone())
            .unwrap_or_default())
    }

    async fn create(
        &self,
        new_identity: NewIdentity,
        password: &str,
    ) -> Result<CreateUserOutcome> {
        if let Some(reason) = validate_new_account(&new_identity, password, &self.policy) {
            return Ok(CreateUserOutcome::Rejected(reason));
        }

        let password_hash = hash_password(password)?;
        let id = Uuid::new_v4();

        let username_key = normalize(&new_identity.username);
        match self.usernames.entry(username_key.clone()) {
            Entry::Occupied(_) => {
                return Ok(CreateUserOutcome::Conflict(format!(
                    "Username '{}' is already taken",
                    new_identity.username
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let identity = Identity {
            id,
            username: new_identity.username,
            email: new_identity.email,
        };

        match self.users.entry(normalize(&identity.email)) {
            Entry::Occupied(_) => {
                self.usernames.remove(&username_key);
                Ok(CreateUserOutcome::Conflict(format!(
                    "Email '{}' is already taken",
                    identity.email
                )))
            }
            Entry::Vacant(slot) => {
                debug!(user_id = %id, "Stored new account in memory");
                slot.insert(StoredUser {
                    identity: identity.clone(),
                    password_hash,
                    roles: Vec::new(),
                });
                Ok(CreateUserOutcome::Created(identity))
            }
        }
    }
}
