//! Employee records (users joined with their employee profile).

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{require_non_blank, DomainError, DomainResult};
use crate::id::UserId;
use crate::value_object::Email;

/// Upper bound of the performance score scale.
pub const MAX_PERFORMANCE_SCORE: f64 = 5.0;

/// An employee as listed by `GET /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(default, alias = "department_name")]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Score clamped to the 0.0–5.0 scale; missing scores count as zero.
    pub fn score(&self) -> f64 {
        self.performance_score
            .unwrap_or(0.0)
            .clamp(0.0, MAX_PERFORMANCE_SCORE)
    }
}

impl Entity for Employee {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Payload for `POST /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl NewEmployee {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("first_name", &self.first_name)?;
        require_non_blank("last_name", &self.last_name)?;
        require_non_blank("password", &self.password)?;
        Email::parse(self.email.trim())?;
        if self.role.trim().is_empty() {
            return Err(DomainError::validation("role is required"));
        }
        Ok(())
    }
}

/// Payload for `PUT /users/:id`; only the present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        if let Some(first_name) = &self.first_name {
            require_non_blank("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            require_non_blank("last_name", last_name)?;
        }
        if let Some(email) = &self.email {
            Email::parse(email.trim())?;
        }
        Ok(())
    }

    /// Prefill an edit form from the cached record.
    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            first_name: Some(employee.first_name.clone()),
            last_name: Some(employee.last_name.clone()),
            email: Some(employee.email.clone()),
            phone: employee.phone.clone(),
            role: Some(employee.role.clone()),
            position: employee.position.clone(),
            address: None,
        }
    }
}
