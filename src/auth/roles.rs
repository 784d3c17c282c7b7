use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The two roles a Shipwise account can hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ManagementStaff,
}

impl Role {
    /// Role assumed for a verified account that carries no role claim.
    pub const LEAST_PRIVILEGED: Role = Role::ManagementStaff;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ManagementStaff => "management_staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "management_staff" => Ok(Role::ManagementStaff),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ALL_ROLES: &[Role] = &[Role::Admin, Role::ManagementStaff];

/// The caller of a request, as established by token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
}
