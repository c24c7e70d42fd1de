//! `cuadre-infra` — storage and orchestration around the drawer aggregate.
//!
//! Composes the append-only event store, the command dispatch pipeline, and
//! the history read model. No HTTP here; the api crate wires these together.

pub mod dispatcher;
pub mod history;
pub mod store;

pub use dispatcher::{CommandDispatcher, DispatchError};
pub use history::{CashRecordView, DrawerHistoryProjection, HistoryFilters};
pub use store::{DrawerEventStore, InMemoryDrawerStore, StoreError, StoredEvent, UncommittedEvent};
