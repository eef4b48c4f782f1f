/// Kafka event producer for identity service
use crate::error::{IdentityError, Result};
use crate::services::events::{EventPublisher, EVENT_SOURCE};
use async_trait::async_trait;
use event_schema::{EventEnvelope, IntegrationEvent, UserCreatedEvent};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// How long librdkafka may queue a message locally before giving up
const QUEUE_TIMEOUT: Duration = Duration::from_secs(30);

/// Kafka event producer service
#[derive(Clone)]
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEventPublisher {
    /// Create a new Kafka event producer
    ///
    /// ## Arguments
    ///
    /// * `brokers` - Comma-separated list of Kafka brokers
    /// * `topic` - Topic user lifecycle events are published to
    pub fn new(brokers: &str, topic: &str) -> Result<Self> {
        let producer = rdkafka::config::ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", EVENT_SOURCE)
            .set("acks", "all")
            .create::<FutureProducer>()
            .map_err(|e| {
                IdentityError::EventPublish(format!("Failed to create Kafka producer: {}", e))
            })?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Generic event publishing method
    async fn publish_event<T: IntegrationEvent + serde::Serialize>(
        &self,
        envelope: &EventEnvelope<T>,
    ) -> Result<()> {
        let payload = serde_json::to_string(envelope).map_err(|e| {
            IdentityError::EventPublish(format!("Failed to serialize envelope: {}", e))
        })?;

        let partition_key = envelope.data.aggregate_id();
        let event_id = envelope.event_id.to_string();
        let correlation_id = envelope
            .correlation_id
            .unwrap_or(envelope.event_id)
            .to_string();
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "event_id",
                value: Some(event_id.as_str()),
            })
            .insert(Header {
                key: "event_type",
                value: Some(envelope.event_type.as_str()),
            })
            .insert(Header {
                key: "correlation_id",
                value: Some(correlation_id.as_str()),
            });

        let record = FutureRecord::to(&self.topic)
            .key(&partition_key)
            .payload(&payload)
            .headers(headers);

        self.producer
            .send(record, QUEUE_TIMEOUT)
            .await
            .map_err(|(error, _)| {
                warn!("Failed to send Kafka event: {:?}", error);
                IdentityError::EventPublish(format!("Failed to publish event to Kafka: {}", error))
            })?;

        debug!(event_id = %event_id, topic = %self.topic, "Event published");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish_user_created(&self, event: &UserCreatedEvent) -> Result<()> {
        let envelope =
            EventEnvelope::new(EVENT_SOURCE, event.clone()).with_correlation_id(Uuid::new_v4());

        self.publish_event(&envelope).await
    }
}
