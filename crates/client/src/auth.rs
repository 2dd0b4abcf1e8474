//! Login state, permission gating and the login form.

use std::sync::Arc;

use tokio::sync::RwLock;

use enterprisepro_auth::{authorize, menu_for, AuthzError, Role, Section, Session, User};
use enterprisepro_core::Email;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::format::{avatar_color, initials};
use crate::shell::Notification;
use crate::storage::{KeyValueStore, REFRESH_TOKEN_KEY, USER_DATA_KEY};

pub const LOGIN_FAILED_MESSAGE: &str = "Error al iniciar sesión. Verifica tus credenciales.";
pub const LOGOUT_MESSAGE: &str = "Sesión cerrada exitosamente";
pub const LOGOUT_PROMPT: &str = "¿Estás seguro de que deseas cerrar sesión?";

#[derive(Debug, Clone, Default)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggedIn(Session),
}

/// Sidebar entry for a section the current role may open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub section: Section,
    pub label: &'static str,
    pub fragment: &'static str,
}

/// Which permission-gated buttons to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionVisibility {
    pub new_employee: bool,
    pub new_project: bool,
}

/// Header badge of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBadge {
    pub name: String,
    pub role_label: String,
    pub initials: String,
    pub avatar_color: &'static str,
}

pub struct AuthManager {
    api: Arc<ApiClient>,
    state: RwLock<AuthState>,
}

impl AuthManager {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(AuthState::LoggedOut),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Restore a persisted session, then show the matching view.
    ///
    /// Returns whether a session was restored.
    pub async fn init(&self) -> Result<bool, ApiError> {
        let store = self.api.store();
        let token = self.api.restore_token().await?;

        let user = match store.get_json::<User>(USER_DATA_KEY).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "cached user is unreadable; starting logged out");
                None
            }
        };

        match (token, user) {
            (Some(access_token), Some(user)) => {
                let refresh_token = store.get(REFRESH_TOKEN_KEY).await?;
                tracing::info!(user_id = %user.id, "session restored");
                self.api.shell().show_main_app(&user);
                *self.state.write().await = AuthState::LoggedIn(Session {
                    access_token,
                    refresh_token,
                    user,
                });
                Ok(true)
            }
            _ => {
                *self.state.write().await = AuthState::LoggedOut;
                self.api.shell().show_login();
                Ok(false)
            }
        }
    }

    /// Log in and load the permission set.
    ///
    /// `Ok(false)` means the credentials were rejected; transport failures
    /// are returned as `Err` so the form can tell them apart.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, ApiError> {
        let shell = self.api.shell().clone();

        let response = match self.api.login(email, password).await {
            Ok(Some(resp)) => resp,
            Ok(None) => {
                tracing::info!(email, "login rejected");
                shell.notify(Notification::error(LOGIN_FAILED_MESSAGE));
                return Ok(false);
            }
            Err(err) => {
                tracing::warn!(email, error = %err, "login failed");
                shell.notify(Notification::error(LOGIN_FAILED_MESSAGE));
                return if err.is_network() { Err(err) } else { Ok(false) };
            }
        };

        let mut user = response.user;
        match self.api.permissions().await {
            Ok(Some(perms)) => user = user.with_permissions(perms.permissions),
            Ok(None) => tracing::warn!("permission load interrupted by a 401"),
            Err(err) => tracing::warn!(error = %err, "failed to load permissions"),
        }
        self.api.store_user(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "logged in");
        shell.show_main_app(&user);
        shell.notify(Notification::success(format!("¡Bienvenido {}!", user.first_name)));

        *self.state.write().await = AuthState::LoggedIn(Session::new(response.tokens, user));
        Ok(true)
    }

    /// Re-fetch the profile and permission list and replace the user snapshot.
    pub async fn reload_permissions(&self) -> Result<Option<User>, ApiError> {
        let Some(profile) = self.api.profile().await? else {
            return Ok(None);
        };
        let Some(perms) = self.api.permissions().await? else {
            return Ok(None);
        };

        let user = profile.user.with_permissions(perms.permissions);
        self.api.store_user(&user).await?;

        let mut state = self.state.write().await;
        if let AuthState::LoggedIn(session) = &mut *state {
            session.user = user.clone();
        }
        tracing::debug!(user_id = %user.id, permissions = user.permissions.len(), "permissions reloaded");
        Ok(Some(user))
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        *self.state.write().await = AuthState::LoggedOut;
        self.api.set_token(None).await?;
        self.api.store().clear_session().await?;

        tracing::info!("logged out");
        let shell = self.api.shell();
        shell.show_login();
        shell.notify(Notification::info(LOGOUT_MESSAGE));
        Ok(())
    }

    /// Logout button: asks first. Returns whether the user logged out.
    pub async fn confirm_logout(&self) -> Result<bool, ApiError> {
        if !self.api.shell().confirm(LOGOUT_PROMPT) {
            return Ok(false);
        }
        self.logout().await?;
        Ok(true)
    }

    pub async fn state(&self) -> AuthState {
        if !self.api.has_token() {
            return AuthState::LoggedOut;
        }
        self.state.read().await.clone()
    }

    /// The logged-in user, unless a forced logout has dropped the token since.
    pub async fn current_user(&self) -> Option<User> {
        match self.state().await {
            AuthState::LoggedIn(session) => Some(session.user),
            AuthState::LoggedOut => None,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.state().await, AuthState::LoggedIn(_))
    }

    pub async fn has_permission(&self, name: &str) -> bool {
        self.current_user()
            .await
            .is_some_and(|user| user.has_permission(name))
    }

    pub async fn require_auth(&self) -> Result<User, AuthzError> {
        match self.current_user().await {
            Some(user) => Ok(user),
            None => {
                self.api.shell().show_login();
                Err(AuthzError::Unauthenticated)
            }
        }
    }

    /// Guard for permission-gated actions; warns the user on denial.
    pub async fn require_permission(&self, permission: &str) -> Result<(), AuthzError> {
        let user = self.require_auth().await?;
        authorize(Some(&user), permission).inspect_err(|err| {
            self.api
                .shell()
                .notify(Notification::warning(err.user_message()));
        })
    }

    pub async fn user_role(&self) -> Role {
        self.current_user()
            .await
            .map(|user| user.role)
            .unwrap_or_default()
    }

    pub async fn is_admin(&self) -> bool {
        self.user_role().await.is_admin()
    }

    pub async fn is_manager(&self) -> bool {
        self.user_role().await.is_manager()
    }

    /// Sidebar items for the current role; nothing when logged out.
    pub async fn menu(&self) -> Vec<MenuItem> {
        let Some(user) = self.current_user().await else {
            return Vec::new();
        };
        menu_for(&user.role)
            .into_iter()
            .map(|section| MenuItem {
                section,
                label: section.title(),
                fragment: section.as_str(),
            })
            .collect()
    }

    pub async fn action_visibility(&self) -> ActionVisibility {
        let Some(user) = self.current_user().await else {
            return ActionVisibility::default();
        };
        ActionVisibility {
            new_employee: user.has_permission("employee.create"),
            new_project: user.has_permission("project.create"),
        }
    }

    pub async fn user_badge(&self) -> Option<UserBadge> {
        let user = self.current_user().await?;
        Some(UserBadge {
            name: user.full_name(),
            role_label: user.role.label().to_string(),
            initials: initials(&user.first_name, &user.last_name),
            avatar_color: avatar_color(&user.first_name),
        })
    }
}

impl core::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthManager").field("api", &self.api).finish()
    }
}

/// Demo credentials offered on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoAccount {
    pub label: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

pub const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount { label: "Administrador", email: "admin@demo.com", password: "admin123" },
    DemoAccount { label: "Gerente", email: "manager@demo.com", password: "manager123" },
    DemoAccount { label: "Empleado", email: "employee@demo.com", password: "emp123" },
];

/// Login form controller.
#[derive(Default, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    error: Option<String>,
    submitting: bool,
}

impl core::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("error", &self.error)
            .field("submitting", &self.submitting)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub const EMPTY_FIELDS: &'static str = "Por favor completa todos los campos";
    pub const INVALID_EMAIL: &'static str = "Por favor ingresa un email válido";
    pub const BAD_CREDENTIALS: &'static str = "Email o contraseña incorrectos.";
    pub const CONNECTION_ERROR: &'static str = "Error de conexión. Intenta nuevamente.";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefill(&mut self, account: &DemoAccount) {
        self.email = account.email.to_string();
        self.password = account.password.to_string();
        self.error = None;
    }

    /// Message under the form, if the last submit failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validate and submit. Returns whether the user is now logged in.
    pub async fn submit(&mut self, auth: &AuthManager) -> bool {
        let email = self.email.trim().to_string();
        if email.is_empty() || self.password.is_empty() {
            self.error = Some(Self::EMPTY_FIELDS.to_string());
            return false;
        }
        if !Email::is_valid(&email) {
            self.error = Some(Self::INVALID_EMAIL.to_string());
            return false;
        }

        self.error = None;
        self.submitting = true;
        let outcome = auth.login(&email, &self.password).await;
        self.submitting = false;

        match outcome {
            Ok(true) => {
                self.password.clear();
                true
            }
            Ok(false) => {
                self.error = Some(Self::BAD_CREDENTIALS.to_string());
                false
            }
            Err(_) => {
                self.error = Some(Self::CONNECTION_ERROR.to_string());
                false
            }
        }
    }
}
