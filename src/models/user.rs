//! User identity as supplied by the auth subsystem.

use serde::{Deserialize, Serialize};

/// Database identifier of a user.
pub type UserId = i64;

/// Role granted by the auth subsystem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Manager" => Some(Role::Manager),
            "Employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

/// Employee roster entry used by reporting views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub user_id: UserId,
    pub full_name: String,
    pub username: String,
}
