/// Postgres-backed credential store
use crate::db::{validate_new_account, CredentialStore};
use crate::error::{IdentityError, Result};
use crate::models::{CreateUserOutcome, Identity, NewIdentity};
use crate::security::{hash_password, verify_password, PasswordPolicy};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const USERNAME_INDEX: &str = "idx_users_username_lower";
const EMAIL_INDEX: &str = "idx_users_email_lower";

pub struct PgCredentialStore {
    pool: PgPool,
    policy: PasswordPolicy,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            policy: PasswordPolicy::default(),
        }
    }

    pub fn with_policy(pool: PgPool, policy: PasswordPolicy) -> Self {
        Self { pool, policy }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| IdentityError::Database(format!("Migration failed: {}", e)))
    }

    /// Append a role to an existing account (no-op when already assigned)
    pub async fn add_role(&self, user_id: Uuid, role: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Maps a unique-index violation to the field it guards
fn conflict_for(err: &sqlx::Error) -> Option<CreateUserOutcome> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }

    let field = match db_err.constraint() {
        Some(USERNAME_INDEX) => "Username",
        Some(EMAIL_INDEX) => "Email",
        _ => "Account",
    };
    Some(CreateUserOutcome::Conflict(format!(
        "{} is already taken",
        field
    )))
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT id, username, email FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn check_password(&self, identity: &Identity, password: &str) -> Result<bool> {
        let password_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
                .bind(identity.id)
                .fetch_optional(&self.pool)
                .await?;

        match password_hash {
            Some(hash) => verify_password(password, &hash),
            None => {
                warn!(user_id = %identity.id, "Account disappeared before password check");
                Ok(false)
            }
        }
    }

    async fn roles(&self, identity: &Identity) -> Result<Vec<String>> {
        let roles = sqlx::query_scalar(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY assigned_at, role",
        )
        .bind(identity.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
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

        let inserted = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_identity.username)
        .bind(new_identity.email.trim())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(identity) => {
                debug!(user_id = %identity.id, "Inserted account");
                Ok(CreateUserOutcome::Created(identity))
            }
            Err(err) => match conflict_for(&err) {
                Some(conflict) => Ok(conflict),
                None => Err(err.into()),
            },
        }
    }
}
