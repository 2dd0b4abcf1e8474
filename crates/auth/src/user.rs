//! The authenticated user snapshot.

use serde::{Deserialize, Serialize};

use enterprisepro_core::UserId;

use crate::{PermissionSet, Role};

/// Profile of the logged-in user.
///
/// Immutable for the lifetime of a login: a permission reload replaces the
/// whole snapshot instead of editing it. `permissions` is absent from the
/// login payload and filled in from `GET /permissions`; it is persisted with
/// the rest of the profile so a restored session keeps its gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// A copy of this snapshot carrying a freshly loaded permission set.
    pub fn with_permissions(&self, permissions: PermissionSet) -> Self {
        Self {
            permissions,
            ..self.clone()
        }
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }
}
