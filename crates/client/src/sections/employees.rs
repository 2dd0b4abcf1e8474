//! Employees section: paginated table and the employee form.

use std::sync::Arc;

use tokio::sync::Mutex;

use enterprisepro_auth::{Permission, Section};
use enterprisepro_core::{find_by_id, DomainError, Employee, EmployeeUpdate, NewEmployee, UserId};

use super::{ActionError, FormMode, LoadTicket, LoadTickets, SectionManager};
use crate::api::{ApiClient, Pagination};
use crate::auth::AuthManager;
use crate::error::ApiError;
use crate::format::{avatar_color, initials, StarRating};
use crate::shell::Notification;

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub id: UserId,
    pub full_name: String,
    pub initials: String,
    pub avatar_color: &'static str,
    pub department: String,
    pub position: String,
    pub email: String,
    pub score: String,
    pub stars: StarRating,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl EmployeeRow {
    pub fn from_employee(employee: &Employee, can_edit: bool, can_delete: bool) -> Self {
        let full_name = employee.full_name();
        let score = employee.score();
        Self {
            id: employee.id,
            initials: initials(&employee.first_name, &employee.last_name),
            avatar_color: avatar_color(&full_name),
            full_name,
            department: non_blank_or(employee.department.as_deref(), "Sin asignar"),
            position: non_blank_or(employee.position.as_deref(), "Sin definir"),
            email: employee.email.clone(),
            score: format!("{score:.1}"),
            stars: StarRating::from_score(score),
            can_edit,
            can_delete,
        }
    }
}

fn non_blank_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[derive(Debug)]
struct EmployeesState {
    employees: Vec<Employee>,
    page: u32,
    has_more: bool,
    form: Option<FormMode<UserId>>,
}

impl Default for EmployeesState {
    fn default() -> Self {
        Self {
            employees: Vec::new(),
            page: 1,
            has_more: false,
            form: None,
        }
    }
}

pub struct EmployeesManager {
    api: Arc<ApiClient>,
    auth: Arc<AuthManager>,
    page_size: u32,
    tickets: LoadTickets,
    state: Mutex<EmployeesState>,
}

impl EmployeesManager {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthManager>, page_size: u32) -> Self {
        Self {
            api,
            auth,
            page_size,
            tickets: LoadTickets::new(),
            state: Mutex::new(EmployeesState::default()),
        }
    }

    /// Fetch the current page.
    pub async fn load_employees(&self) -> Result<(), ApiError> {
        let page = self.state.lock().await.page;
        self.load_page(page).await
    }

    async fn load_page(&self, page: u32) -> Result<(), ApiError> {
        if !self.auth.is_authenticated().await {
            return Ok(());
        }

        let ticket = self.tickets.issue();
        match self.api.users(page, self.page_size).await {
            Ok(Some(resp)) => {
                self.apply_page(ticket, resp.users, resp.pagination).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                tracing::error!(page, error = %err, "failed to load employees");
                self.api
                    .shell()
                    .notify(Notification::error("Error al cargar empleados"));
                Err(err)
            }
        }
    }

    /// Store a fetched page if `ticket` is still the latest load.
    pub async fn apply_page(
        &self,
        ticket: LoadTicket,
        employees: Vec<Employee>,
        pagination: Pagination,
    ) -> bool {
        let mut state = self.state.lock().await;
        if !self.tickets.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale employee page");
            return false;
        }
        state.employees = employees;
        state.page = pagination.page.max(1);
        state.has_more = pagination.has_more;
        true
    }

    pub fn issue_ticket(&self) -> LoadTicket {
        self.tickets.issue()
    }

    /// Advance one page when the server reported more rows.
    pub async fn next_page(&self) -> Result<bool, ApiError> {
        let (page, has_more) = {
            let state = self.state.lock().await;
            (state.page, state.has_more)
        };
        if !has_more {
            return Ok(false);
        }
        self.load_page(page + 1).await?;
        Ok(true)
    }

    pub async fn previous_page(&self) -> Result<bool, ApiError> {
        let page = self.state.lock().await.page;
        if page <= 1 {
            return Ok(false);
        }
        self.load_page(page - 1).await?;
        Ok(true)
    }

    pub async fn page(&self) -> u32 {
        self.state.lock().await.page
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.has_more
    }

    pub async fn employees(&self) -> Vec<Employee> {
        self.state.lock().await.employees.clone()
    }

    pub async fn rows(&self) -> Vec<EmployeeRow> {
        let can_edit = self.auth.has_permission(Permission::EMPLOYEE_UPDATE.as_str()).await;
        let can_delete = self.auth.has_permission(Permission::EMPLOYEE_DELETE.as_str()).await;
        self.state
            .lock()
            .await
            .employees
            .iter()
            .map(|e| EmployeeRow::from_employee(e, can_edit, can_delete))
            .collect()
    }

    pub async fn form(&self) -> Option<FormMode<UserId>> {
        self.state.lock().await.form
    }

    pub async fn open_create(&self) -> Result<(), ActionError> {
        self.auth
            .require_permission(Permission::EMPLOYEE_CREATE.as_str())
            .await?;
        self.state.lock().await.form = Some(FormMode::Create);
        Ok(())
    }

    pub async fn open_edit(&self, id: UserId) -> Result<EmployeeUpdate, ActionError> {
        self.auth
            .require_permission(Permission::EMPLOYEE_UPDATE.as_str())
            .await?;
        let mut state = self.state.lock().await;
        let employee = find_by_id(&state.employees, id)
            .ok_or_else(|| ApiError::from(DomainError::not_found()))?;
        let prefill = EmployeeUpdate::from_employee(employee);
        state.form = Some(FormMode::Edit(id));
        Ok(prefill)
    }

    pub async fn close_form(&self) {
        self.state.lock().await.form = None;
    }

    pub async fn create(&self, employee: &NewEmployee) -> Result<Option<UserId>, ActionError> {
        self.auth
            .require_permission(Permission::EMPLOYEE_CREATE.as_str())
            .await?;
        let created = self
            .save(false, self.api.create_user(employee).await)
            .await?;
        Ok(created.map(|c| c.user_id))
    }

    pub async fn update(&self, id: UserId, update: &EmployeeUpdate) -> Result<bool, ActionError> {
        self.auth
            .require_permission(Permission::EMPLOYEE_UPDATE.as_str())
            .await?;
        let ack = self.save(true, self.api.update_user(id, update).await).await?;
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
                    "Empleado actualizado exitosamente"
                } else {
                    "Empleado creado exitosamente"
                }));
                self.close_form().await;
                self.reload_after_change().await;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::error!(error = %err, "failed to save employee");
                shell.notify(Notification::error("Error al guardar empleado"));
                Err(err.into())
            }
        }
    }

    /// Delete after the permission check and an explicit confirmation.
    pub async fn delete(&self, id: UserId) -> Result<bool, ActionError> {
        self.auth
            .require_permission(Permission::EMPLOYEE_DELETE.as_str())
            .await?;
        let full_name = {
            let state = self.state.lock().await;
            find_by_id(&state.employees, id)
                .map(Employee::full_name)
                .ok_or_else(|| ApiError::from(DomainError::not_found()))?
        };

        let shell = self.api.shell();
        if !shell.confirm(&format!("¿Estás seguro de que deseas eliminar a {full_name}?")) {
            return Err(ActionError::Cancelled);
        }

        match self.api.delete_user(id).await {
            Ok(Some(_)) => {
                tracing::info!(user_id = %id, "employee deleted");
                shell.notify(Notification::success("Empleado eliminado exitosamente"));
                self.reload_after_change().await;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                shell.notify(Notification::error("Error al eliminar empleado"));
                Err(err.into())
            }
        }
    }

    async fn reload_after_change(&self) {
        if let Err(err) = self.load_employees().await {
            tracing::warn!(error = %err, "employee list refresh after change failed");
        }
    }
}

#[async_trait::async_trait]
impl SectionManager for EmployeesManager {
    fn section(&self) -> Section {
        Section::Employees
    }

    async fn load(&self) -> Result<(), ApiError> {
        self.load_employees().await
    }

    async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        self.tickets.issue();
        *state = EmployeesState::default();
    }
}
