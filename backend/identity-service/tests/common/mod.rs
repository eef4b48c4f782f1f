// Shared fixtures for identity-service integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use event_schema::UserCreatedEvent;
use identity_service::config::JwtSettings;
use identity_service::db::InMemoryCredentialStore;
use identity_service::security::TokenIssuer;
use identity_service::services::{AuthService, EventPublisher};
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "k3Q9vZp2Lx7Wm4Rt8Yb1Nc6Hd0Fg5Js2";

/// Publisher that keeps every event it is handed
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<UserCreatedEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<UserCreatedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_user_created(
        &self,
        event: &UserCreatedEvent,
    ) -> identity_service::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret_key: TEST_SECRET.to_string(),
        issuer: "orderflow-identity".to_string(),
        audience: "orderflow-api".to_string(),
        expiry_minutes: 60,
    }
}

pub struct TestContext {
    pub auth: Arc<AuthService>,
    pub issuer: Arc<TokenIssuer>,
    pub store: Arc<InMemoryCredentialStore>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn test_context() -> TestContext {
    let issuer = Arc::new(TokenIssuer::new(&jwt_settings()).unwrap());
    let store = Arc::new(InMemoryCredentialStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let auth = Arc::new(AuthService::new(
        store.clone(),
        issuer.clone(),
        publisher.clone(),
    ));

    TestContext {
        auth,
        issuer,
        store,
        publisher,
    }
}
