use serde::{Deserialize, Serialize};

use crate::Role;

/// The user on whose behalf an operation runs.
///
/// Supplied per call by the front end; the core never persists actors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn stocker(name: impl Into<String>) -> Self {
        Self::new(name, Role::Stocker)
    }

    pub fn viewer(name: impl Into<String>) -> Self {
        Self::new(name, Role::Viewer)
    }

    pub fn manager(name: impl Into<String>) -> Self {
        Self::new(name, Role::Manager)
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}
