/// Service layer for identity-service
///
/// - Auth engine (login, registration)
/// - Event publishers (Kafka, logging fallback)
pub mod auth;
pub mod events;
pub mod kafka_events;

pub use auth::{AuthService, DEFAULT_PUBLISH_TIMEOUT};
pub use events::{EventPublisher, LoggingEventPublisher, EVENT_SOURCE};
pub use kafka_events::KafkaEventPublisher;
