//! Per-section data managers.

pub mod dashboard;
pub mod employees;
pub mod projects;

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use enterprisepro_auth::{AuthzError, Section};

use crate::error::ApiError;

pub use dashboard::{ActivityItem, DashboardManager, KpiCard, KpiCards, KpiKind};
pub use employees::{EmployeeRow, EmployeesManager};
pub use projects::{ProjectCard, ProjectFilters, ProjectsManager};

/// Identifier of one list load; higher is newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Issues tickets and remembers the latest one.
///
/// A response may only be applied while its ticket is still the latest, so a
/// slow response can never overwrite a newer one.
#[derive(Debug, Default)]
pub struct LoadTickets {
    latest: AtomicU64,
}

impl LoadTickets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Whether an open modal form creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode<Id> {
    Create,
    Edit(Id),
}

/// Failure of a user-initiated section action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The user dismissed the confirmation prompt.
    #[error("action cancelled")]
    Cancelled,
}

/// A section with data to load when it becomes active.
#[async_trait::async_trait]
pub trait SectionManager: Send + Sync {
    fn section(&self) -> Section;

    async fn load(&self) -> Result<(), ApiError>;

    /// Viewport width changed.
    fn on_resize(&self, _width: u32) {}

    /// Release cached data and background work.
    async fn cleanup(&self) {}
}
