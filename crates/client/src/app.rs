//! Application controller: the single active section, navigation inputs,
//! sidebar preference and session-level background work.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use enterprisepro_auth::{authorize_section, AuthzError, Role, Section};

use crate::api::ApiClient;
use crate::auth::{AuthManager, LoginForm};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::inactivity::InactivityMonitor;
use crate::sections::{DashboardManager, EmployeesManager, ProjectsManager, SectionManager};
use crate::shell::{Notification, Shell};
use crate::storage::{KeyValueStore, SqliteStore, SIDEBAR_COLLAPSED_KEY};

pub const APP_NAME: &str = "EnterprisePro";
pub const INACTIVITY_PROMPT: &str = "¿Has estado inactivo por un tiempo. ¿Deseas continuar tu sesión?";

/// Viewports at or below this width get a collapsed sidebar.
pub const MOBILE_BREAKPOINT: u32 = 768;

/// A key press as delivered by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub alt: bool,
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn alt(key: &str) -> Self {
        Self { key: key.to_string(), alt: true, ctrl: false }
    }

    pub fn ctrl(key: &str) -> Self {
        Self { key: key.to_string(), alt: false, ctrl: true }
    }
}

/// Contents of the help dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpInfo {
    pub shortcuts: Vec<(&'static str, &'static str)>,
    pub version: &'static str,
    pub user_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Navigated(Section),
    Help(HelpInfo),
}

#[derive(Debug)]
struct AppState {
    active: Section,
    sidebar_collapsed: bool,
    initialized: bool,
}

pub struct AppController {
    me: Weak<AppController>,
    api: Arc<ApiClient>,
    auth: Arc<AuthManager>,
    dashboard: Arc<DashboardManager>,
    projects: Arc<ProjectsManager>,
    employees: Arc<EmployeesManager>,
    inactivity: Arc<InactivityMonitor>,
    state: Mutex<AppState>,
}

impl AppController {
    /// Wire every service around an existing store and shell.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        shell: Arc<dyn Shell>,
    ) -> Result<Arc<Self>, ApiError> {
        let api = Arc::new(ApiClient::new(config, store, shell)?);
        let auth = Arc::new(AuthManager::new(api.clone()));
        let dashboard = DashboardManager::new(
            api.clone(),
            auth.clone(),
            config.dashboard_refresh_interval(),
        );
        let projects = Arc::new(ProjectsManager::new(
            api.clone(),
            auth.clone(),
            config.projects_page_size,
        ));
        let employees = Arc::new(EmployeesManager::new(
            api.clone(),
            auth.clone(),
            config.employees_page_size,
        ));
        let inactivity = Arc::new(InactivityMonitor::new(config.inactivity_timeout()));

        Ok(Arc::new_cyclic(|me| Self {
            me: me.clone(),
            api,
            auth,
            dashboard,
            projects,
            employees,
            inactivity,
            state: Mutex::new(AppState {
                active: Section::Dashboard,
                sidebar_collapsed: false,
                initialized: false,
            }),
        }))
    }

    /// Open the durable session store from configuration and wire the app.
    pub async fn open(config: &ClientConfig, shell: Arc<dyn Shell>) -> anyhow::Result<Arc<Self>> {
        let path = config.resolved_storage_path()?;
        let store = SqliteStore::open(&path).await?;
        tracing::info!(path = %path.display(), api = %config.api_base_url, "client storage opened");
        Ok(Self::new(config, Arc::new(store), shell)?)
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn dashboard(&self) -> &Arc<DashboardManager> {
        &self.dashboard
    }

    pub fn projects(&self) -> &Arc<ProjectsManager> {
        &self.projects
    }

    pub fn employees(&self) -> &Arc<EmployeesManager> {
        &self.employees
    }

    pub fn inactivity(&self) -> &Arc<InactivityMonitor> {
        &self.inactivity
    }

    fn shell(&self) -> &Arc<dyn Shell> {
        self.api.shell()
    }

    fn manager_for(&self, section: Section) -> Option<&dyn SectionManager> {
        match section {
            Section::Dashboard => Some(self.dashboard.as_ref()),
            Section::Projects => Some(self.projects.as_ref()),
            Section::Employees => Some(self.employees.as_ref()),
            Section::Tasks | Section::Reports | Section::Settings => None,
        }
    }

    fn managers(&self) -> [&dyn SectionManager; 3] {
        [
            self.dashboard.as_ref(),
            self.projects.as_ref(),
            self.employees.as_ref(),
        ]
    }

    /// Restore the session and sidebar, show the dashboard and start idle detection.
    pub async fn init(&self) -> Result<(), ApiError> {
        if self.state.lock().await.initialized {
            return Ok(());
        }

        let authenticated = self.auth.init().await?;
        self.restore_sidebar().await?;
        if authenticated {
            self.show_section(Section::Dashboard).await;
        }
        self.start_inactivity_monitor();

        self.state.lock().await.initialized = true;
        tracing::info!(authenticated, "application initialized");
        Ok(())
    }

    /// Stop background work and drop cached section data.
    pub async fn shutdown(&self) {
        self.inactivity.stop();
        for manager in self.managers() {
            manager.cleanup().await;
        }
        self.state.lock().await.initialized = false;
        tracing::info!("application shut down");
    }

    fn start_inactivity_monitor(&self) {
        let app = self.me.clone();
        self.inactivity.start(move || {
            let app = app.clone();
            async move {
                if let Some(app) = app.upgrade() {
                    app.handle_inactivity().await;
                }
            }
        });
    }

    /// Submit the login form; on success the dashboard becomes active.
    pub async fn submit_login(&self, form: &mut LoginForm) -> bool {
        if !form.submit(&self.auth).await {
            return false;
        }
        self.inactivity.record_activity();
        self.show_section(Section::Dashboard).await;
        true
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        for manager in self.managers() {
            manager.cleanup().await;
        }
        self.auth.logout().await
    }

    pub async fn active_section(&self) -> Section {
        self.state.lock().await.active
    }

    pub async fn can_access_section(&self, section: Section) -> bool {
        let user = self.auth.current_user().await;
        authorize_section(user.as_ref(), section).is_ok()
    }

    /// Switch to `section` if the current role may open it.
    ///
    /// A denial leaves the active section untouched and shows a warning.
    pub async fn show_section(&self, section: Section) -> bool {
        let user = self.auth.current_user().await;
        if let Err(err) = authorize_section(user.as_ref(), section) {
            let message = AuthzError::SectionDenied(section).user_message();
            tracing::debug!(%section, error = %err, "navigation blocked");
            self.shell().notify(Notification::warning(message));
            return false;
        }

        self.state.lock().await.active = section;

        if let Some(manager) = self.manager_for(section) {
            if let Err(err) = manager.load().await {
                tracing::warn!(%section, error = %err, "section data failed to load");
            }
        }

        self.shell()
            .set_location(section.as_str(), &format!("{} - {APP_NAME}", section.title()));
        tracing::info!(%section, "navigated");
        true
    }

    /// Navigate by name; unknown names are refused like forbidden ones.
    pub async fn show_section_named(&self, name: &str) -> bool {
        match Section::parse(name) {
            Some(section) => self.show_section(section).await,
            None => {
                self.shell().notify(Notification::warning(
                    AuthzError::SectionDenied(Section::Dashboard).user_message(),
                ));
                false
            }
        }
    }

    /// Address fragment changed; unknown or forbidden fragments are ignored.
    pub async fn handle_fragment_change(&self, fragment: &str) -> bool {
        let name = fragment.trim_start_matches('#');
        let Some(section) = Section::parse(name) else {
            return false;
        };
        if !self.can_access_section(section).await {
            return false;
        }
        self.show_section(section).await
    }

    pub async fn handle_key(&self, event: &KeyEvent) -> KeyOutcome {
        self.inactivity.record_activity();
        let key = event.key.to_lowercase();

        let target = match (event.alt, event.ctrl, key.as_str()) {
            (true, _, "d") => Some(Section::Dashboard),
            (true, _, "p") => Some(Section::Projects),
            (true, _, "e") => {
                if !self.can_access_section(Section::Employees).await {
                    return KeyOutcome::Ignored;
                }
                Some(Section::Employees)
            }
            (_, true, "/") => return KeyOutcome::Help(self.help().await),
            _ => None,
        };

        match target {
            Some(section) if self.show_section(section).await => KeyOutcome::Navigated(section),
            _ => KeyOutcome::Ignored,
        }
    }

    pub async fn help(&self) -> HelpInfo {
        HelpInfo {
            shortcuts: vec![
                ("Alt + D", "Ir al Dashboard"),
                ("Alt + P", "Ir a Proyectos"),
                ("Alt + E", "Ir a Empleados"),
                ("Ctrl + /", "Mostrar esta ayuda"),
            ],
            version: env!("CARGO_PKG_VERSION"),
            user_name: self.auth.current_user().await.map(|u| u.full_name()),
            role: self.auth.user_role().await,
        }
    }

    /// Viewport resized; narrow screens collapse the sidebar.
    pub async fn handle_resize(&self, width: u32) {
        if width <= MOBILE_BREAKPOINT {
            self.state.lock().await.sidebar_collapsed = true;
            self.shell().set_sidebar_collapsed(true);
        }
        for manager in self.managers() {
            manager.on_resize(width);
        }
    }

    pub async fn sidebar_collapsed(&self) -> bool {
        self.state.lock().await.sidebar_collapsed
    }

    /// Flip the sidebar and persist the preference.
    pub async fn toggle_sidebar(&self) -> Result<bool, ApiError> {
        let collapsed = {
            let mut state = self.state.lock().await;
            state.sidebar_collapsed = !state.sidebar_collapsed;
            state.sidebar_collapsed
        };
        self.shell().set_sidebar_collapsed(collapsed);
        self.api
            .store()
            .set(SIDEBAR_COLLAPSED_KEY, if collapsed { "true" } else { "false" })
            .await?;
        Ok(collapsed)
    }

    async fn restore_sidebar(&self) -> Result<(), ApiError> {
        let collapsed = self
            .api
            .store()
            .get(SIDEBAR_COLLAPSED_KEY)
            .await?
            .is_some_and(|v| v == "true");
        self.state.lock().await.sidebar_collapsed = collapsed;
        if collapsed {
            self.shell().set_sidebar_collapsed(true);
        }
        Ok(())
    }

    /// Any user input resets the idle timer.
    pub fn record_activity(&self) {
        self.inactivity.record_activity();
    }

    /// Idle timeout reached: ask to continue, log out on refusal.
    pub async fn handle_inactivity(&self) {
        if !self.auth.is_authenticated().await {
            return;
        }
        if self.shell().confirm(INACTIVITY_PROMPT) {
            tracing::debug!("session continued after inactivity prompt");
            return;
        }
        if let Err(err) = self.logout().await {
            tracing::warn!(error = %err, "logout after inactivity failed");
        }
    }
}

impl core::fmt::Debug for AppController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppController").field("api", &self.api).finish_non_exhaustive()
    }
}
