use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cuadre_core::RecordId;

/// Envelope for an event, carrying stream metadata.
///
/// This is the unit you publish to the bus after appending to a stream.
///
/// Notes:
/// - **Append-only**: `sequence_number` is monotonically increasing per stream.
/// - `payload` is the domain-agnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    record_id: RecordId,

    /// Monotonically increasing position in the record's stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, record_id: RecordId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            record_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
