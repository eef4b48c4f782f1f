/// Event Schema Registry for identity integration events
///
/// Defines the versioned contracts other services consume. Every event carries
/// an identifier and a creation timestamp that are fixed when the event is
/// constructed, so a redelivered message keeps the idempotency key consumers
/// deduplicate on.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for all events
pub const SCHEMA_VERSION: u32 = 1;

/// Common surface of every integration event
pub trait IntegrationEvent {
    /// Stable event type name used for routing
    const EVENT_TYPE: &'static str;

    /// Identifier assigned at construction
    fn event_id(&self) -> Uuid;

    /// Creation timestamp assigned at construction
    fn created_at(&self) -> DateTime<Utc>;

    /// Key used to partition events of the same aggregate
    fn aggregate_id(&self) -> String;
}

/// Base event envelope for all broker messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Same value as the wrapped event's id
    pub event_id: Uuid,
    /// Routing name, e.g. "UserCreatedEvent"
    pub event_type: String,
    /// Same value as the wrapped event's creation time
    pub timestamp: DateTime<Utc>,
    /// Schema version for compatibility checking
    pub schema_version: u32,
    /// Source service that generated the event
    pub source: String,
    /// Correlation ID for distributed tracing
    pub correlation_id: Option<Uuid>,
    /// Actual event payload
    pub data: T,
}

impl<T: IntegrationEvent> EventEnvelope<T> {
    pub fn new(source: impl Into<String>, data: T) -> Self {
        Self {
            event_id: data.event_id(),
            event_type: T::EVENT_TYPE.to_string(),
            timestamp: data.created_at(),
            schema_version: SCHEMA_VERSION,
            source: source.into(),
            correlation_id: None,
            data,
        }
    }
}

impl<T> EventEnvelope<T> {
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

// ============================================================================
// IDENTITY EVENTS
// ============================================================================

/// Emitted once a newly registered account has been persisted.
///
/// Fields are private: the id and timestamp are generated in [`UserCreatedEvent::new`]
/// and only ever read afterwards, including after a serde round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    user_id: Uuid,
    email: String,
    event_id: Uuid,
    created_at: DateTime<Utc>,
}

impl UserCreatedEvent {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            event_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl IntegrationEvent for UserCreatedEvent {
    const EVENT_TYPE: &'static str = "UserCreatedEvent";

    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn aggregate_id(&self) -> String {
        self.user_id.to_string()
    }
}
