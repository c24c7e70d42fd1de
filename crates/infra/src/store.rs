//! Append-only event store for cash record streams.
//!
//! One stream per record (and therefore per business date, since the record
//! id is derived from the date). The store assigns sequence numbers during
//! append and enforces optimistic concurrency via `ExpectedVersion`; this is
//! also what makes "one record per day" atomic, because a second open of the
//! same date appends with `Exact(0)` against a non-empty stream and fails.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use cuadre_core::{ExpectedVersion, RecordId};
use cuadre_events::EventEnvelope;

/// Event store operation error. Infrastructure failures only; domain
/// validation happens before events are ever produced.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("payload serialization failed: {0}")]
    Serialize(String),
}

/// An event ready to be appended to a stream, not yet assigned a sequence
/// number. Built from a typed domain event via [`UncommittedEvent::from_typed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub record_id: RecordId,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl UncommittedEvent {
    pub fn from_typed<E>(record_id: RecordId, event_id: Uuid, event: &E) -> Result<Self, StoreError>
    where
        E: cuadre_events::Event + Serialize,
    {
        let payload =
            serde_json::to_value(event).map_err(|e| StoreError::Serialize(e.to_string()))?;

        Ok(Self {
            event_id,
            record_id,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}

/// A persisted event with its stream position assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub record_id: RecordId,

    /// Monotonically increasing position in the record stream, starting at 1.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn stream_version(&self) -> u64 {
        self.sequence_number
    }

    /// Convert into an envelope for publication on the bus.
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.event_id,
            self.record_id,
            self.sequence_number,
            self.payload.clone(),
        )
    }
}

/// Append-only event store over cash record streams.
///
/// - **Optimistic locking** via `ExpectedVersion`.
/// - **Append-only**: events are never modified or deleted; a reopen appends
///   on top of the closure it supersedes.
/// - `load_stream()` returns an empty vector for a stream that does not
///   exist yet.
pub trait DrawerEventStore: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, StoreError>;

    fn load_stream(&self, record_id: RecordId) -> Result<Vec<StoredEvent>, StoreError>;

    /// Load every stream, in no particular order between streams. Used to
    /// rebuild projections at startup.
    fn load_all(&self) -> Result<Vec<StoredEvent>, StoreError>;
}

impl<S> DrawerEventStore for Arc<S>
where
    S: DrawerEventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        (**self).append(events, expected_version)
    }

    fn load_stream(&self, record_id: RecordId) -> Result<Vec<StoredEvent>, StoreError> {
        (**self).load_stream(record_id)
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, StoreError> {
        (**self).load_all()
    }
}

/// In-memory append-only event store.
///
/// Intended for tests and single-process deployments. Not optimized for
/// performance.
#[derive(Debug, Default)]
pub struct InMemoryDrawerStore {
    streams: RwLock<HashMap<RecordId, Vec<StoredEvent>>>,
}

impl InMemoryDrawerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl DrawerEventStore for InMemoryDrawerStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        // All events in a batch must target the same stream.
        let record_id = events[0].record_id;
        for (idx, e) in events.iter().enumerate() {
            if e.record_id != record_id {
                return Err(StoreError::InvalidAppend(format!(
                    "batch contains multiple record_ids (index {idx})"
                )));
            }
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| StoreError::InvalidAppend("lock poisoned".to_string()))?;

        let stream = streams.entry(record_id).or_default();
        let current = Self::current_version(stream);

        if !expected_version.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                record_id: e.record_id,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            };
            next += 1;
            stream.push(stored.clone());
            committed.push(stored);
        }

        Ok(committed)
    }

    fn load_stream(&self, record_id: RecordId) -> Result<Vec<StoredEvent>, StoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| StoreError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(streams.get(&record_id).cloned().unwrap_or_default())
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, StoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| StoreError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(streams.values().flatten().cloned().collect())
    }
}
