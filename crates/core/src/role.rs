//! Operator roles.
//!
//! The role set is closed: the back office only knows admin, caja and
//! soporte. Capability checks live inside the drawer's transition functions
//! (not in the HTTP layer), so a different caller cannot bypass them.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Register operator.
    Caja,
    Soporte,
}

impl Role {
    /// Privileged roles may override the opening balance, reopen a same-day
    /// closed record, and browse the full history.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Soporte)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Caja => "caja",
            Role::Soporte => "soporte",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "caja" => Ok(Role::Caja),
            "soporte" => Ok(Role::Soporte),
            other => Err(DomainError::invalid_id(format!("unknown role '{other}'"))),
        }
    }
}
