//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Aggregate (encounter) this event belongs to.
    pub aggregate_id: Uuid,
    /// Monotonically increasing version within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Flattens the event into the change notification handed to observers.
    fn envelope(&self) -> EventEnvelope {
        let metadata = self.metadata();
        EventEnvelope {
            event_id: metadata.event_id,
            event_type: self.event_type(),
            sequence_number: metadata.sequence_number,
            correlation_id: metadata.correlation_id,
            occurred_at: metadata.occurred_at,
            payload: self.to_payload(),
        }
    }
}

/// A recorded change, as reported to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event type name.
    pub event_type: &'static str,
    /// Position in the encounter's event stream.
    pub sequence_number: i64,
    /// Correlation ID of the command that caused it.
    pub correlation_id: Uuid,
    /// When the event was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub payload: serde_json::Value,
}
