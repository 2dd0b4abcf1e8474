//! Top-level dashboard sections and the static role → section access table.

use serde::{Deserialize, Serialize};

use crate::Role;

/// One top-level view of the dashboard. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Dashboard,
    Projects,
    Employees,
    Tasks,
    Reports,
    Settings,
}

impl Section {
    /// Menu order.
    pub const ALL: [Section; 6] = [
        Section::Dashboard,
        Section::Projects,
        Section::Employees,
        Section::Tasks,
        Section::Reports,
        Section::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Projects => "projects",
            Section::Employees => "employees",
            Section::Tasks => "tasks",
            Section::Reports => "reports",
            Section::Settings => "settings",
        }
    }

    pub fn parse(name: &str) -> Option<Section> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Roles allowed to open this section.
    pub fn allowed_roles(&self) -> Vec<Role> {
        match self {
            Section::Dashboard | Section::Projects | Section::Tasks => {
                vec![Role::ADMIN, Role::MANAGER, Role::EMPLOYEE]
            }
            Section::Employees | Section::Reports => vec![Role::ADMIN, Role::MANAGER],
            Section::Settings => vec![Role::ADMIN],
        }
    }

    pub fn is_allowed_for(&self, role: &Role) -> bool {
        self.allowed_roles().contains(role)
    }

    /// Page title shown while the section is active.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Projects => "Proyectos",
            Section::Employees => "Empleados",
            Section::Tasks => "Tareas",
            Section::Reports => "Reportes",
            Section::Settings => "Configuración",
        }
    }
}

impl core::fmt::Display for Section {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sections visible in the sidebar for `role`, in menu order.
///
/// Anything outside this list is hidden, not merely disabled.
pub fn menu_for(role: &Role) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|s| s.is_allowed_for(role))
        .collect()
}
