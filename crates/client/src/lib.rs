//! `enterprisepro-client`: client core of the EnterprisePro business dashboard.
//!
//! Talks to the EnterprisePro REST backend, keeps the login session, gates
//! actions on permissions and drives the section views through a [`Shell`].
//! Rendering is left to whoever implements [`Shell`]; [`HeadlessShell`] records
//! calls instead.
//!
//! Services are constructed explicitly and shared by `Arc`:
//! [`ApiClient`] → [`AuthManager`] → section managers → [`AppController`].

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod inactivity;
pub mod sections;
pub mod shell;
pub mod storage;

pub use api::{ApiClient, ConnectivityState};
pub use app::{AppController, HelpInfo, KeyEvent, KeyOutcome};
pub use auth::{ActionVisibility, AuthManager, AuthState, LoginForm, MenuItem, UserBadge, DEMO_ACCOUNTS};
pub use config::ClientConfig;
pub use error::{ApiError, StorageError};
pub use inactivity::InactivityMonitor;
pub use sections::{
    ActionError, DashboardManager, EmployeeRow, EmployeesManager, FormMode, KpiCards, LoadTicket,
    ProjectCard, ProjectFilters, ProjectsManager, SectionManager,
};
pub use shell::{HeadlessShell, Notification, NotificationLevel, Shell, View};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
