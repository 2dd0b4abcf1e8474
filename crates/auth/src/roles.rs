use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings on the wire; the three the dashboard knows about
/// are exposed as constants. Unknown roles are carried through unchanged and
/// simply match no section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const MANAGER: Role = Role(Cow::Borrowed("manager"));
    pub const EMPLOYEE: Role = Role(Cow::Borrowed("employee"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::ADMIN
    }

    pub fn is_manager(&self) -> bool {
        *self == Self::MANAGER
    }

    /// Human-readable label for profile views.
    pub fn label(&self) -> &str {
        match self.as_str() {
            "admin" => "Administrador",
            "manager" => "Gerente",
            "employee" => "Empleado",
            other => other,
        }
    }
}

/// With no user loaded the dashboard treats the visitor as an employee.
impl Default for Role {
    fn default() -> Self {
        Self::EMPLOYEE
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
