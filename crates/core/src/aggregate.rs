//! Aggregate traits: pure transition functions over an event stream.

use crate::error::{DomainError, DomainResult};

/// Minimal aggregate-root interface: identity plus a monotonically
/// increasing state version (the stream revision for event-sourced state).
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an append.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stream to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Execution semantics of an aggregate.
///
/// - `handle(&self, cmd)` decides which events to emit. It must not mutate
///   state and must not perform IO.
/// - `apply(&mut self, event)` evolves in-memory state deterministically,
///   bumping `version()` by one per applied event.
///
/// Keeping the two halves separate is what makes every lifecycle transition
/// independently testable without any storage or HTTP framework.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
