/// Event publishing capability
///
/// The auth engine announces new accounts through [`EventPublisher`]. Delivery
/// is at-least-once with no subscriber acknowledgment; implementations return
/// once the transport has accepted the message.
use crate::error::Result;
use async_trait::async_trait;
use event_schema::{EventEnvelope, IntegrationEvent, UserCreatedEvent};
use tracing::info;

/// Value of the envelope `source` field
pub const EVENT_SOURCE: &str = "identity-service";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_user_created(&self, event: &UserCreatedEvent) -> Result<()>;
}

/// Publisher used when no broker is configured: the envelope is logged and
/// dropped.
#[derive(Debug, Default, Clone)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish_user_created(&self, event: &UserCreatedEvent) -> Result<()> {
        let envelope = EventEnvelope::new(EVENT_SOURCE, event.clone());
        info!(
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            aggregate_id = %event.aggregate_id(),
            "No broker configured, dropping event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_logging_publisher_accepts_events() {
        let publisher = LoggingEventPublisher;
        let event = UserCreatedEvent::new(Uuid::new_v4(), "alice@test.com");

        assert!(publisher.publish_user_created(&event).await.is_ok());
    }
}
