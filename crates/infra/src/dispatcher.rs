//! Command execution pipeline.
//!
//! One consistent lifecycle for every drawer command:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load events from store
//!   ↓
//! 2. Rehydrate aggregate (apply history)
//!   ↓
//! 3. Handle command (pure decision logic, produces events)
//!   ↓
//! 4. Persist events (append-only, optimistic concurrency check)
//!   ↓
//! 5. Publish events to bus (for projections)
//! ```
//!
//! Events are persisted before publication; if the bus fails after a
//! successful append, the caller gets `Publish` and may retry just the
//! distribution (at-least-once, consumers are idempotent).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use cuadre_core::{Aggregate, DomainError, ExpectedVersion, RecordId};
use cuadre_events::{EventBus, EventEnvelope};

use crate::store::{DrawerEventStore, StoreError, StoredEvent, UncommittedEvent};

#[derive(Debug)]
pub enum DispatchError {
    /// Optimistic concurrency failure, including "record already exists".
    Concurrency(String),
    /// Domain validation failure (deterministic).
    Validation(String),
    /// Domain invariant failure (deterministic).
    InvariantViolation(String),
    /// Domain authorization failure.
    Unauthorized(String),
    /// Domain-level not found.
    NotFound,
    /// Failed to deserialize historical event payloads.
    Deserialize(String),
    /// Persisting to the event store failed.
    Store(StoreError),
    /// Publication failed after a successful append.
    Publish(String),
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match &value {
            StoreError::Concurrency(msg) => DispatchError::Concurrency(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
            DomainError::Unauthorized(msg) => DispatchError::Unauthorized(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Reusable command execution engine for the drawer aggregate.
///
/// Generic over the store and bus so tests run fully in memory and a real
/// backend can be swapped in without touching domain code.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: DrawerEventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full pipeline, returning the committed
    /// events with their assigned sequence numbers.
    ///
    /// The `make_aggregate` closure constructs a fresh, empty instance for
    /// rehydration; the dispatcher never needs to know how aggregates are
    /// initialized.
    pub fn dispatch<A>(
        &self,
        record_id: RecordId,
        command: A::Command,
        make_aggregate: impl FnOnce(RecordId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: cuadre_events::Event + Serialize + DeserializeOwned,
    {
        // 1) Load history
        let history = self.store.load_stream(record_id)?;
        validate_loaded_stream(record_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        // 2) Rehydrate aggregate
        let mut aggregate = make_aggregate(record_id);
        apply_history::<A>(&mut aggregate, &history)?;

        // 3) Decide events (no mutation)
        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        // 4) Persist (append-only, optimistic)
        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(record_id, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        // 5) Publish committed events (after append)
        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }

    /// Rehydrate an aggregate without dispatching a command. Read paths use
    /// this to get current state straight from the stream.
    pub fn load<A>(
        &self,
        record_id: RecordId,
        make_aggregate: impl FnOnce(RecordId) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(record_id)?;
        validate_loaded_stream(record_id, &history)?;

        let mut aggregate = make_aggregate(record_id);
        apply_history::<A>(&mut aggregate, &history)?;
        Ok(aggregate)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(record_id: RecordId, stream: &[StoredEvent]) -> Result<(), DispatchError> {
    // Reject cross-stream mixing and non-monotonic sequence numbers even if
    // a buggy backend returns them.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.record_id != record_id {
            return Err(DispatchError::Store(StoreError::InvalidAppend(format!(
                "loaded stream contains wrong record_id at index {idx}"
            ))));
        }
        if e.sequence_number == 0 {
            return Err(DispatchError::Store(StoreError::InvalidAppend(
                "stored event has sequence_number=0".to_string(),
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(StoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    // Ensure deterministic ordering.
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|e| e.sequence_number);

    for stored in sorted {
        let ev: A::Event = serde_json::from_value(stored.payload)
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
