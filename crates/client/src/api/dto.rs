//! Request and response bodies of the backend REST API.

use serde::{Deserialize, Serialize};

use enterprisepro_auth::{PermissionSet, Role, TokenPair, User};
use enterprisepro_core::{Employee, Project, ProjectId, UserId};

/// Connectivity state of the client, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// The backend answered the last request.
    Online,
    /// The last request failed at the transport level.
    Offline,
}

#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl core::fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `GET /auth/profile`: the user row plus the employee profile, if any.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
    #[serde(default)]
    pub employee: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsResponse {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub users: Vec<Employee>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPage {
    #[serde(default)]
    pub projects: Vec<Project>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreated {
    #[serde(default)]
    pub message: Option<String>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreated {
    #[serde(default)]
    pub message: Option<String>,
    pub project_id: ProjectId,
}

/// Acknowledgement body of updates and deletes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
