//! Per-request caller identity, attested by the upstream gateway.

use cuadre_core::{Role, UserId};

/// Identity and role of the authenticated caller.
#[derive(Debug, Clone)]
pub struct CallerContext {
    user_id: UserId,
    username: String,
    role: Role,
}

impl CallerContext {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
