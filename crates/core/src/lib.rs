//! `enterprisepro-core`: domain records exchanged with the EnterprisePro backend.
//!
//! This crate contains **pure data** (no HTTP, no storage). Every record here is
//! server-owned; the client only ever holds a cached copy from the last fetch.

pub mod employee;
pub mod entity;
pub mod error;
pub mod id;
pub mod metrics;
pub mod project;
pub mod value_object;

pub use employee::{Employee, EmployeeUpdate, NewEmployee};
pub use entity::{find_by_id, Entity};
pub use error::{DomainError, DomainResult};
pub use id::{ProjectId, UserId};
pub use metrics::{DashboardMetrics, EmployeeStats, FinancialMetric, ProjectStats};
pub use project::{NewProject, Project, ProjectPriority, ProjectStatus, ProjectUpdate};
pub use value_object::{Email, ValueObject};
