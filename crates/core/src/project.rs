//! Project records and their form payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{require_non_blank, DomainError, DomainResult};
use crate::id::ProjectId;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Planning,
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    /// Label shown on project cards.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planificación",
            ProjectStatus::Active => "Activo",
            ProjectStatus::Completed => "Completado",
            ProjectStatus::Cancelled => "Cancelado",
        }
    }
}

/// Project priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl ProjectPriority {
    pub const ALL: [ProjectPriority; 4] = [
        ProjectPriority::Low,
        ProjectPriority::Medium,
        ProjectPriority::High,
        ProjectPriority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectPriority::Low => "low",
            ProjectPriority::Medium => "medium",
            ProjectPriority::High => "high",
            ProjectPriority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectPriority::Low => "Baja",
            ProjectPriority::Medium => "Media",
            ProjectPriority::High => "Alta",
            ProjectPriority::Urgent => "Urgente",
        }
    }
}

macro_rules! impl_from_str_lowercase {
    ($t:ty, $name:literal) => {
        impl core::str::FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$t>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| DomainError::validation(format!("unknown {}: {}", $name, s)))
            }
        }
    };
}

impl_from_str_lowercase!(ProjectStatus, "status");
impl_from_str_lowercase!(ProjectPriority, "priority");

/// A project as returned by `GET /projects` and `GET /projects/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: ProjectPriority,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub spent_budget: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub assigned_to_lastname: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
}

impl Project {
    /// Progress rounded to a whole percentage in 0..=100.
    pub fn progress_percent(&self) -> u8 {
        self.progress.unwrap_or(0.0).round().clamp(0.0, 100.0) as u8
    }

    /// Deadline as a calendar date; the backend may append a time part.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        let raw = self.deadline.as_deref()?.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    /// Assignee display name, if any.
    pub fn assignee(&self) -> Option<String> {
        let first = self.assigned_to_name.as_deref()?;
        match self.assigned_to_lastname.as_deref() {
            Some(last) if !last.is_empty() => Some(format!("{first} {last}")),
            _ => Some(first.to_string()),
        }
    }
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> ProjectId {
        self.id
    }
}

/// Check a progress value against the 0–100 range the backend accepts.
pub fn validate_progress(progress: f64) -> DomainResult<()> {
    if !(0.0..=100.0).contains(&progress) {
        return Err(DomainError::OutOfRange {
            field: "progress",
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

/// Payload for `POST /projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: ProjectPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl NewProject {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("description", &self.description)?;
        validate_budget(self.budget)
    }
}

/// Payload for `PUT /projects/:id`; only the present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<ProjectPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        validate_budget(self.budget)
    }

    /// Prefill an edit form from the cached record.
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: Some(project.name.clone()),
            description: project.description.clone(),
            status: Some(project.status),
            priority: Some(project.priority),
            budget: project.budget,
            client_name: project.client_name.clone(),
            deadline: project.deadline_date(),
        }
    }
}

fn validate_budget(budget: Option<f64>) -> DomainResult<()> {
    match budget {
        Some(b) if !b.is_finite() || b < 0.0 => {
            Err(DomainError::validation("budget must be a non-negative amount"))
        }
        _ => Ok(()),
    }
}
