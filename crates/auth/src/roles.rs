use core::str::FromStr;

use serde::{Deserialize, Serialize};
use stockroom_core::DomainError;

/// Role identifier used for RBAC.
///
/// The set is closed: every operation names exactly one of these roles and an
/// actor passes only if its role is that role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registers products and moves stock.
    Stocker,
    /// Queries stock reports and files purchase requests.
    Viewer,
    /// Authorizes or cancels purchase requests.
    Manager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Stocker, Role::Viewer, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Stocker => "stocker",
            Role::Viewer => "viewer",
            Role::Manager => "manager",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Stocker => "can register and move products",
            Role::Viewer => "can query stock reports",
            Role::Manager => "can authorize purchase requests",
        }
    }

    pub fn descriptor(&self) -> RoleDescriptor {
        RoleDescriptor {
            role: *self,
            description: self.description(),
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
        match s {
            "stocker" => Ok(Role::Stocker),
            "viewer" => Ok(Role::Viewer),
            "manager" => Ok(Role::Manager),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Role definition as seeded into the `user_roles` table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDescriptor {
    pub role: Role,
    pub description: &'static str,
}
