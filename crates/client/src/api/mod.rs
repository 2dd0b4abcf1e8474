//! HTTP client for the EnterprisePro backend.
//!
//! Every call goes through [`ApiClient::request`], which:
//! - attaches the bearer token and an `x-request-id`,
//! - keeps the shell loading indicator on for the duration of the call,
//! - turns a 401 into a single refresh attempt (or a forced logout),
//! - reports failures as an error notification before returning them.

pub mod dto;

use std::sync::{Arc, Mutex, RwLock};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use enterprisepro_auth::{TokenPair, User};
use enterprisepro_core::{
    DashboardMetrics, EmployeeUpdate, NewEmployee, NewProject, Project, ProjectId, ProjectUpdate,
    UserId,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::shell::{Notification, Shell};
use crate::storage::{ACCESS_TOKEN_KEY, KeyValueStore, REFRESH_TOKEN_KEY, USER_DATA_KEY};

pub use dto::{
    Ack, ConnectivityState, HealthStatus, LoginResponse, Pagination, PermissionsResponse,
    ProfileResponse, ProjectCreated, ProjectPage, UserCreated, UserPage,
};
use dto::{LoginRequest, ProgressUpdate, RefreshRequest};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Result of a single HTTP round trip, before 401 handling.
enum Outcome {
    Unauthorized,
    Body(Value),
}

/// Keeps the loading indicator on until dropped.
struct LoadingGuard<'a> {
    shell: &'a dyn Shell,
}

impl<'a> LoadingGuard<'a> {
    fn new(shell: &'a dyn Shell) -> Self {
        shell.set_loading(true);
        Self { shell }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.shell.set_loading(false);
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    replay_after_refresh: bool,
    token: RwLock<Option<String>>,
    connectivity: Mutex<ConnectivityState>,
    // Serialises 401 handling; waiters that find a newer token skip the refresh.
    refresh_lock: tokio::sync::Mutex<()>,
    store: Arc<dyn KeyValueStore>,
    shell: Arc<dyn Shell>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        shell: Arc<dyn Shell>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            replay_after_refresh: config.replay_after_refresh,
            token: RwLock::new(None),
            connectivity: Mutex::new(ConnectivityState::Online),
            refresh_lock: tokio::sync::Mutex::new(()),
            store,
            shell,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn shell(&self) -> &Arc<dyn Shell> {
        &self.shell
    }

    /// Load the persisted access token into memory.
    pub async fn restore_token(&self) -> Result<Option<String>, ApiError> {
        let token = self.store.get(ACCESS_TOKEN_KEY).await?;
        *self.token_slot_mut() = token.clone();
        Ok(token)
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    fn token_slot_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set (and persist) the access token; `None` clears both copies.
    pub async fn set_token(&self, token: Option<&str>) -> Result<(), ApiError> {
        *self.token_slot_mut() = token.map(str::to_string);
        match token {
            Some(t) => self.store.set(ACCESS_TOKEN_KEY, t).await?,
            None => self.store.remove(ACCESS_TOKEN_KEY).await?,
        }
        Ok(())
    }

    /// Default headers: JSON content type, plus the bearer token when set.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.token() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("access token is not a valid header value; sending without it"),
            }
        }
        headers
    }

    pub fn connectivity(&self) -> ConnectivityState {
        *self
            .connectivity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_connectivity(&self, state: ConnectivityState) {
        let mut current = self
            .connectivity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current != state {
            tracing::info!(?state, "connectivity changed");
            *current = state;
        }
    }

    /// Perform a JSON request against `endpoint` (relative to the base URL).
    ///
    /// Returns `Ok(None)` when the backend answered 401: the session has been
    /// refreshed or torn down and the caller should not use the result.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let request_id = Uuid::now_v7();
        let span = tracing::info_span!("api_request", %method, endpoint, %request_id);

        async move {
            let _loading = LoadingGuard::new(self.shell.as_ref());

            let result = self.execute(&method, endpoint, body.as_ref(), request_id).await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "API error");
                self.shell.notify(Notification::error(err.message()));
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
        request_id: Uuid,
    ) -> Result<Option<Value>, ApiError> {
        let sent_with = self.token();
        match self.send(method, endpoint, body, request_id).await? {
            Outcome::Body(value) => Ok(Some(value)),
            Outcome::Unauthorized => {
                let refreshed = self.handle_unauthorized(sent_with.as_deref()).await;
                if !(refreshed && self.replay_after_refresh) {
                    return Ok(None);
                }

                tracing::debug!("replaying request with refreshed token");
                match self.send(method, endpoint, body, request_id).await? {
                    Outcome::Body(value) => Ok(Some(value)),
                    Outcome::Unauthorized => {
                        self.force_logout().await;
                        Ok(None)
                    }
                }
            }
        }
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
        request_id: Uuid,
    ) -> Result<Outcome, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers())
            .header(HeaderName::from_static(REQUEST_ID_HEADER), request_id.to_string());
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                self.set_connectivity(ConnectivityState::Offline);
                return Err(ApiError::Network(e.to_string()));
            }
        };
        self.set_connectivity(ConnectivityState::Online);

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend answered 401");
            return Ok(Outcome::Unauthorized);
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Outcome::Body(Value::Null));
        }
        serde_json::from_str(&text)
            .map(Outcome::Body)
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// React to a 401: try the stored refresh token once, else log out.
    ///
    /// `rejected` is the access token the failed request carried. If another
    /// task replaced or cleared it while this one waited for the lock, its
    /// outcome is reused. Returns `true` when a fresh token is in place.
    async fn handle_unauthorized(&self, rejected: Option<&str>) -> bool {
        let _guard = self.refresh_lock.lock().await;

        let current = self.token();
        if rejected.is_some() && current.as_deref() != rejected {
            tracing::debug!(refreshed = current.is_some(), "401 already handled by another request");
            return current.is_some();
        }

        let refresh_token = match self.store.get(REFRESH_TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::info!("no refresh token; ending session");
                self.force_logout().await;
                return false;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read refresh token");
                self.force_logout().await;
                return false;
            }
        };

        match self.try_refresh(&refresh_token).await {
            Ok(()) => {
                tracing::info!("access token refreshed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed");
                self.force_logout().await;
                false
            }
        }
    }

    async fn try_refresh(&self, refresh_token: &str) -> Result<(), ApiError> {
        let url = format!("{}/auth/refresh", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        let tokens: TokenPair = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        self.store_tokens(&tokens).await
    }

    async fn store_tokens(&self, tokens: &TokenPair) -> Result<(), ApiError> {
        self.set_token(Some(&tokens.access_token)).await?;
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token).await?;
        Ok(())
    }

    /// Drop every trace of the session and ask the shell to reload.
    pub async fn force_logout(&self) {
        if let Err(err) = self.store.clear_session().await {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        *self.token_slot_mut() = None;
        self.shell.reload();
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        match self.request(method, endpoint, body).await? {
            Some(value) => decode(value).map(Some).inspect_err(|err| {
                tracing::error!(endpoint, error = %err, "unexpected response body");
                self.shell.notify(Notification::error(err.message()));
            }),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// `POST /auth/login`; on success stores both tokens and the profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<LoginResponse>, ApiError> {
        let body = to_body(&LoginRequest { email, password })?;
        let response: Option<LoginResponse> = self.call(Method::POST, "/auth/login", Some(body)).await?;

        if let Some(resp) = &response {
            self.store_tokens(&resp.tokens).await?;
            self.store.set_json(USER_DATA_KEY, &resp.user).await?;
        }
        Ok(response)
    }

    /// `POST /auth/refresh` with the stored refresh token.
    ///
    /// Unlike the automatic 401 path this never logs out; it reports whether
    /// new tokens were stored.
    pub async fn refresh(&self) -> Result<bool, ApiError> {
        let Some(refresh_token) = self.store.get(REFRESH_TOKEN_KEY).await? else {
            return Ok(false);
        };
        let _guard = self.refresh_lock.lock().await;
        self.try_refresh(&refresh_token).await?;
        Ok(true)
    }

    pub async fn profile(&self) -> Result<Option<ProfileResponse>, ApiError> {
        self.call(Method::GET, "/auth/profile", None).await
    }

    pub async fn permissions(&self) -> Result<Option<PermissionsResponse>, ApiError> {
        self.call(Method::GET, "/permissions", None).await
    }

    /// Persist an updated profile snapshot under `user_data`.
    pub async fn store_user(&self, user: &User) -> Result<(), ApiError> {
        self.store.set_json(USER_DATA_KEY, user).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn users(&self, page: u32, per_page: u32) -> Result<Option<UserPage>, ApiError> {
        let endpoint = format!("/users?page={page}&per_page={per_page}");
        self.call(Method::GET, &endpoint, None).await
    }

    pub async fn create_user(&self, user: &NewEmployee) -> Result<Option<UserCreated>, ApiError> {
        user.validate()?;
        self.call(Method::POST, "/users", Some(to_body(user)?)).await
    }

    pub async fn update_user(&self, id: UserId, update: &EmployeeUpdate) -> Result<Option<Ack>, ApiError> {
        update.validate()?;
        let endpoint = format!("/users/{id}");
        self.call(Method::PUT, &endpoint, Some(to_body(update)?)).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<Option<Ack>, ApiError> {
        let endpoint = format!("/users/{id}");
        self.call(Method::DELETE, &endpoint, None).await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub async fn projects(&self, page: u32, per_page: u32) -> Result<Option<ProjectPage>, ApiError> {
        let endpoint = format!("/projects?page={page}&per_page={per_page}");
        self.call(Method::GET, &endpoint, None).await
    }

    pub async fn project(&self, id: ProjectId) -> Result<Option<Project>, ApiError> {
        let endpoint = format!("/projects/{id}");
        self.call(Method::GET, &endpoint, None).await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Option<ProjectCreated>, ApiError> {
        project.validate()?;
        self.call(Method::POST, "/projects", Some(to_body(project)?)).await
    }

    pub async fn update_project(&self, id: ProjectId, update: &ProjectUpdate) -> Result<Option<Ack>, ApiError> {
        update.validate()?;
        let endpoint = format!("/projects/{id}");
        self.call(Method::PUT, &endpoint, Some(to_body(update)?)).await
    }

    pub async fn update_project_progress(&self, id: ProjectId, progress: f64) -> Result<Option<Ack>, ApiError> {
        enterprisepro_core::project::validate_progress(progress)?;
        let endpoint = format!("/projects/{id}/progress");
        self.call(Method::PUT, &endpoint, Some(to_body(&ProgressUpdate { progress })?))
            .await
    }

    pub async fn delete_project(&self, id: ProjectId) -> Result<Option<Ack>, ApiError> {
        let endpoint = format!("/projects/{id}");
        self.call(Method::DELETE, &endpoint, None).await
    }

    // ------------------------------------------------------------------
    // Dashboard / system
    // ------------------------------------------------------------------

    pub async fn dashboard_metrics(&self) -> Result<Option<DashboardMetrics>, ApiError> {
        self.call(Method::GET, "/dashboard/metrics", None).await
    }

    /// `GET /health`; the outcome also updates [`ApiClient::connectivity`].
    pub async fn health(&self) -> Result<Option<HealthStatus>, ApiError> {
        self.call(Method::GET, "/health", None).await
    }
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.has_token())
            .field("replay_after_refresh", &self.replay_after_refresh)
            .finish()
    }
}

/// Server `error` field, then `message`, then `HTTP <status>`.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .into_iter()
                .find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

fn to_body<T: Serialize + ?Sized>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}
