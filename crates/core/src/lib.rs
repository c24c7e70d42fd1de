//! `cuadre-core` — domain foundation for the cash drawer reconciliation engine.
//!
//! Pure domain primitives only; no IO, no HTTP, no storage concerns.

pub mod aggregate;
pub mod date;
pub mod error;
pub mod id;
pub mod role;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use date::BusinessDate;
pub use error::{DomainError, DomainResult};
pub use id::{RecordId, UserId};
pub use role::Role;
