//! Strongly-typed identifiers.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::BusinessDate;
use crate::error::DomainError;

/// UUIDv5 namespace for date-derived cash record identifiers.
const RECORD_NAMESPACE: Uuid = Uuid::from_u128(0x6f3a_21c4_9d0b_4e87_a5c2_18fd_3b60_74ee);

/// Identifier of a user (operator identity as handed over by the gateway).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Identifier of a cash drawer record (one stream per business date).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Derive the record id for a business date.
    ///
    /// Deterministic (UUIDv5 over the ISO date), so every caller resolves a
    /// given date to the same event stream. This is what makes the
    /// one-record-per-date invariant enforceable at the store boundary: a
    /// second Open for the same date lands on an already-populated stream.
    pub fn for_date(date: BusinessDate) -> Self {
        Self(Uuid::new_v5(&RECORD_NAMESPACE, date.to_string().as_bytes()))
    }
}

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(UserId, "UserId");
impl_uuid_newtype!(RecordId, "RecordId");

impl UserId {
    /// Fresh random identifier (UUIDv7, time-ordered). Tests mostly.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}
