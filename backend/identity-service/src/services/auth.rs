/// Auth engine: login and registration
///
/// Stateless per call. Credentials, hashing and validation policy belong to
/// the injected [`CredentialStore`]; announcements go through the injected
/// [`EventPublisher`].
use crate::db::CredentialStore;
use crate::error::Result;
use crate::models::{CreateUserOutcome, LoginResponse, NewIdentity, RegisterOutcome};
use crate::security::{ClaimSet, TokenIssuer};
use crate::services::events::EventPublisher;
use event_schema::{IntegrationEvent, UserCreatedEvent};
use resilience::with_timeout_result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    issuer: Arc<TokenIssuer>,
    publisher: Arc<dyn EventPublisher>,
    publish_timeout: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        issuer: Arc<TokenIssuer>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            issuer,
            publisher,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    /// Authenticate and issue a token.
    ///
    /// Unknown email and wrong password both come back as `Ok(None)`; `Err`
    /// means the store or the signer failed.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<LoginResponse>> {
        let Some(identity) = self.store.find_by_email(email).await? else {
            info!("Login rejected");
            return Ok(None);
        };

        if !self.store.check_password(&identity, password).await? {
            info!("Login rejected");
            return Ok(None);
        }

        let roles = self.store.roles(&identity).await?;
        let claims = ClaimSet::from_identity(&identity, &roles);
        let issued = self.issuer.issue(claims)?;

        info!(user_id = %identity.id, "Login succeeded");
        Ok(Some(LoginResponse {
            token: issued.token,
            expiration_at_utc: issued.expires_at,
        }))
    }

    /// Create an account and announce it.
    ///
    /// The outcome is decided by the store alone; publishing never changes it.
    pub async fn register(&self, email: &str, password: &str) -> RegisterOutcome {
        let new_identity = NewIdentity::from_email(email);

        match self.store.create(new_identity, password).await {
            Ok(CreateUserOutcome::Created(created)) => {
                info!(user_id = %created.id, "Account created");
            }
            Ok(CreateUserOutcome::Conflict(reason)) => {
                info!(reason = %reason, "Registration refused");
                return RegisterOutcome::Conflict(reason);
            }
            Ok(CreateUserOutcome::Rejected(reason)) => {
                info!(reason = %reason, "Registration rejected");
                return RegisterOutcome::ValidationError(reason);
            }
            Err(err) => {
                error!(error = %err, "Credential store failed during registration");
                return RegisterOutcome::StoreError(err.to_string());
            }
        }

        let identity = match self.store.find_by_email(email).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                error!("Created account not found on re-fetch");
                return RegisterOutcome::StoreError("Created account not found".to_string());
            }
            Err(err) => {
                error!(error = %err, "Re-fetch of created account failed");
                return RegisterOutcome::StoreError(err.to_string());
            }
        };

        let event = UserCreatedEvent::new(identity.id, identity.email.as_str());
        self.publish(&event).await;

        RegisterOutcome::Created {
            user_id: identity.id,
        }
    }

    async fn publish(&self, event: &UserCreatedEvent) {
        let published = with_timeout_result(
            self.publish_timeout,
            self.publisher.publish_user_created(event),
        )
        .await;

        if let Err(err) = published {
            warn!(
                event_id = %event.event_id(),
                error = %err,
                "Failed to publish UserCreatedEvent"
            );
        }
    }
}
