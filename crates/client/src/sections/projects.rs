//! Projects section: list, client-side filters and the project form.

use std::sync::Arc;

use tokio::sync::Mutex;

use enterprisepro_auth::{Permission, Section};
use enterprisepro_core::{
    find_by_id, DomainError, NewProject, Project, ProjectId, ProjectPriority, ProjectStatus,
    ProjectUpdate,
};

use super::{ActionError, FormMode, LoadTicket, LoadTickets, SectionManager};
use crate::api::ApiClient;
use crate::auth::AuthManager;
use crate::error::ApiError;
use crate::format::{format_currency, format_date};
use crate::shell::Notification;

/// Client-side filters over the fetched project list.
///
/// Each field narrows independently, so applying filters is idempotent and
/// the order fields are applied in does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilters {
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    /// Case-insensitive substring over name, description and client name.
    pub search: String,
}

impl ProjectFilters {
    pub fn matches(&self, project: &Project) -> bool {
        if self.status.is_some_and(|s| s != project.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != project.priority) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(project.name.as_str()),
            project.description.as_deref(),
            project.client_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn apply(&self, projects: &[Project]) -> Vec<Project> {
        projects
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.search.trim().is_empty()
    }
}

/// Card shown for each project in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCard {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub status_label: &'static str,
    pub priority: ProjectPriority,
    pub priority_label: &'static str,
    pub progress: u8,
    pub budget: String,
    pub spent: String,
    pub deadline: String,
    pub client_name: Option<String>,
    pub assignee: Option<String>,
    pub can_edit: bool,
}

impl ProjectCard {
    pub fn from_project(project: &Project, can_edit: bool) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            description: project
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "Sin descripción".to_string()),
            status: project.status,
            status_label: project.status.label(),
            priority: project.priority,
            priority_label: project.priority.label(),
            progress: project.progress_percent(),
            budget: match project.budget {
                Some(b) if b != 0.0 => format_currency(b),
                _ => "No definido".to_string(),
            },
            spent: format_currency(project.spent_budget.unwrap_or(0.0)),
            deadline: project
                .deadline_date()
                .map(format_date)
                .unwrap_or_else(|| "Sin fecha límite".to_string()),
            client_name: project.client_name.clone(),
            assignee: project.assignee(),
            can_edit,
        }
    }
}

#[derive(Debug, Default)]
struct ProjectsState {
    projects: Vec<Project>,
    filters: ProjectFilters,
    form: Option<FormMode<ProjectId>>,
}

pub struct ProjectsManager {
    api: Arc<ApiClient>,
    auth: Arc<AuthManager>,
    page_size: u32,
    tickets: LoadTickets,
    state: Mutex<ProjectsState>,
}

impl ProjectsManager {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthManager>, page_size: u32) -> Self {
        Self {
            api,
            auth,
            page_size,
            tickets: LoadTickets::new(),
            state: Mutex::new(ProjectsState::default()),
        }
    }

    /// Fetch the first page and replace the cached list.
    pub async fn load_projects(&self) -> Result<(), ApiError> {
        if !self.auth.is_authenticated().await {
            return Ok(());
        }

        let ticket = self.tickets.issue();
        match self.api.projects(1, self.page_size).await {
            Ok(Some(page)) => {
                self.apply_page(ticket, page.projects).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "failed to load projects");
                self.api
                    .shell()
                    .notify(Notification::error("Error al cargar proyectos"));
                Err(err)
            }
        }
    }

    /// Store a fetched list if `ticket` is still the latest load.
    pub async fn apply_page(&self, ticket: LoadTicket, projects: Vec<Project>) -> bool {
        let mut state = self.state.lock().await;
        if !self.tickets.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale project list");
            return false;
        }
        tracing::debug!(count = projects.len(), "projects loaded");
        state.projects = projects;
        true
    }

    pub fn issue_ticket(&self) -> LoadTicket {
        self.tickets.issue()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.lock().await.projects.clone()
    }

    pub async fn filters(&self) -> ProjectFilters {
        self.state.lock().await.filters.clone()
    }

    pub async fn set_filters(&self, filters: ProjectFilters) {
        self.state.lock().await.filters = filters;
    }

    pub async fn set_status_filter(&self, status: Option<ProjectStatus>) {
        self.state.lock().await.filters.status = status;
    }

    pub async fn set_priority_filter(&self, priority: Option<ProjectPriority>) {
        self.state.lock().await.filters.priority = priority;
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.lock().await.filters.search = search.into();
    }

    /// Cached projects that pass the current filters.
    pub async fn filtered(&self) -> Vec<Project> {
        let state = self.state.lock().await;
        state.filters.apply(&state.projects)
    }

    pub async fn cards(&self) -> Vec<ProjectCard> {
        let can_edit = self.auth.has_permission(Permission::PROJECT_UPDATE.as_str()).await;
        self.filtered()
            .await
            .iter()
            .map(|p| ProjectCard::from_project(p, can_edit))
            .collect()
    }

    /// Fetch a single project for the details view.
    pub async fn view(&self, id: ProjectId) -> Result<Option<Project>, ApiError> {
        self.api.project(id).await.inspect_err(|_| {
            self.api
                .shell()
                .notify(Notification::error("Error al cargar proyecto"));
        })
    }

    pub async fn form(&self) -> Option<FormMode<ProjectId>> {
        self.state.lock().await.form
    }

    pub async fn open_create(&self) -> Result<ProjectUpdate, ActionError> {
        self.auth
            .require_permission(Permission::PROJECT_CREATE.as_str())
            .await?;
        self.state.lock().await.form = Some(FormMode::Create);
        Ok(ProjectUpdate {
            status: Some(ProjectStatus::default()),
            priority: Some(ProjectPriority::default()),
            ..ProjectUpdate::default()
        })
    }

    /// Open the edit form prefilled from the cached record.
    pub async fn open_edit(&self, id: ProjectId) -> Result<ProjectUpdate, ActionError> {
        self.auth
            .require_permission(Permission::PROJECT_UPDATE.as_str())
            .await?;
        let mut state = self.state.lock().await;
        let project = find_by_id(&state.projects, id)
            .ok_or_else(|| ApiError::from(DomainError::not_found()))?;
        let prefill = ProjectUpdate::from_project(project);
        state.form = Some(FormMode::Edit(id));
        Ok(prefill)
    }

    pub async fn close_form(&self) {
        self.state.lock().await.form = None;
    }

    pub async fn create(&self, project: &NewProject) -> Result<Option<ProjectId>, ActionError> {
        self.auth
            .require_permission(Permission::PROJECT_CREATE.as_str())
            .await?;
        let created = self.save(false, self.api.create_project(project).await).await?;
        Ok(created.map(|c| c.project_id))
    }

    pub async fn update(&self, id: ProjectId, update: &ProjectUpdate) -> Result<bool, ActionError> {
        self.auth
            .require_permission(Permission::PROJECT_UPDATE.as_str())
            .await?;
        let ack = self.save(true, self.api.update_project(id, update).await).await?;
        Ok(ack.is_some())
    }

    async fn save<T>(
        &self,
        editing: bool,
        result: Result<Option<T>, ApiError>,
    ) -> Result<Option<T>, ActionError> {
        let shell = self.api.shell();

        match result {
            Ok(Some(value)) => {
                shell.notify(Notification::success(if editing {
                    "Proyecto actualizado exitosamente"
                } else {
                    "Proyecto creado exitosamente"
                }));
                self.close_form().await;
                self.reload_after_change().await;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::error!(error = %err, "failed to save project");
                shell.notify(Notification::error("Error al guardar proyecto"));
                Err(err.into())
            }
        }
    }

    pub async fn update_progress(&self, id: ProjectId, progress: f64) -> Result<bool, ActionError> {
        self.auth
            .require_permission(Permission::PROJECT_UPDATE.as_str())
            .await?;
        match self.api.update_project_progress(id, progress).await? {
            Some(_) => {
                self.api
                    .shell()
                    .notify(Notification::success("Progreso actualizado exitosamente"));
                self.reload_after_change().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn delete(&self, id: ProjectId) -> Result<bool, ActionError> {
        self.auth
            .require_permission(Permission::PROJECT_DELETE.as_str())
            .await?;
        let name = {
            let state = self.state.lock().await;
            find_by_id(&state.projects, id)
                .map(|p| p.name.clone())
                .ok_or_else(|| ApiError::from(DomainError::not_found()))?
        };

        let shell = self.api.shell();
        if !shell.confirm(&format!("¿Estás seguro de que deseas eliminar el proyecto {name}?")) {
            return Err(ActionError::Cancelled);
        }

        match self.api.delete_project(id).await {
            Ok(Some(_)) => {
                shell.notify(Notification::success("Proyecto eliminado exitosamente"));
                self.reload_after_change().await;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                shell.notify(Notification::error("Error al eliminar proyecto"));
                Err(err.into())
            }
        }
    }

    async fn reload_after_change(&self) {
        if let Err(err) = self.load_projects().await {
            tracing::warn!(error = %err, "project list refresh after change failed");
        }
    }
}

#[async_trait::async_trait]
impl SectionManager for ProjectsManager {
    fn section(&self) -> Section {
        Section::Projects
    }

    async fn load(&self) -> Result<(), ApiError> {
        self.load_projects().await
    }

    async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        // Any load still in flight now holds a stale ticket.
        self.tickets.issue();
        *state = ProjectsState::default();
    }
}
