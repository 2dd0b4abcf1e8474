//! Stub EnterprisePro backend for black-box tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use enterprisepro_client::{AppController, ClientConfig, HeadlessShell, MemoryStore};

pub struct Account {
    pub id: i64,
    pub email: &'static str,
    pub password: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub role: &'static str,
}

pub const ACCOUNTS: [Account; 3] = [
    Account { id: 1, email: "admin@demo.com", password: "admin123", first_name: "Admin", last_name: "Demo", role: "admin" },
    Account { id: 2, email: "manager@demo.com", password: "manager123", first_name: "María", last_name: "Gómez", role: "manager" },
    Account { id: 3, email: "employee@demo.com", password: "emp123", first_name: "Juan", last_name: "Pérez", role: "employee" },
];

fn account(email: &str) -> Option<&'static Account> {
    ACCOUNTS.iter().find(|a| a.email == email)
}

fn permissions(role: &str) -> Vec<&'static str> {
    match role {
        "admin" => vec![
            "employee.create", "employee.read", "employee.update", "employee.delete",
            "project.create", "project.read", "project.update", "project.delete",
            "metrics.read",
        ],
        "manager" => vec![
            "employee.read", "employee.update",
            "project.create", "project.read", "project.update",
            "metrics.read",
        ],
        _ => vec!["project.read", "task.read"],
    }
}

#[derive(Default)]
pub struct StubState {
    /// Access token -> account email.
    pub access_tokens: HashMap<String, &'static str>,
    pub refresh_tokens: HashMap<String, &'static str>,
    pub refresh_disabled: bool,
    pub refresh_calls: usize,
    /// Hits per `"METHOD /path"` (path without query string).
    pub hits: HashMap<String, usize>,
    pub request_ids: Vec<String>,
    pub projects_always_unauthorized: bool,
    /// Scripted `(delay_ms, project names)` per `GET /projects` call.
    pub project_script: VecDeque<(u64, Vec<&'static str>)>,
    pub deleted_users: Vec<i64>,
    pub progress_updates: Vec<(i64, f64)>,
    issued: usize,
}

impl StubState {
    fn issue_tokens(&mut self, email: &'static str) -> Value {
        self.issued += 1;
        let access = format!("access-{}", self.issued);
        let refresh = format!("refresh-{}", self.issued);
        self.access_tokens.insert(access.clone(), email);
        self.refresh_tokens.insert(refresh.clone(), email);
        json!({
            "access_token": access,
            "refresh_token": refresh,
            "token_type": "Bearer",
            "expires_in": 28800
        })
    }
}

#[derive(Clone, Default)]
pub struct Stub {
    inner: Arc<Mutex<StubState>>,
}

impl Stub {
    pub fn state(&self) -> MutexGuard<'_, StubState> {
        self.inner.lock().unwrap()
    }

    /// Invalidate every issued access token (refresh tokens stay valid).
    pub fn expire_access_tokens(&self) {
        self.state().access_tokens.clear();
    }

    pub fn refresh_calls(&self) -> usize {
        self.state().refresh_calls
    }

    pub fn hits(&self, key: &str) -> usize {
        self.state().hits.get(key).copied().unwrap_or(0)
    }

    fn record(&self, key: &str, headers: &HeaderMap) {
        let mut state = self.state();
        *state.hits.entry(key.to_string()).or_default() += 1;
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            state.request_ids.push(id.to_string());
        }
    }

    fn caller(&self, headers: &HeaderMap) -> Option<&'static Account> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let email = *self.state().access_tokens.get(token)?;
        account(email)
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Token inválido" }))).into_response()
}

fn project_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "status": "active",
        "priority": "high",
        "progress": 40.0,
        "budget": 10000.0,
        "deadline": "2025-03-01"
    })
}

async fn login(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    stub.record("POST /auth/login", &headers);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match account(email) {
        Some(acc) if acc.password == password => {
            let tokens = stub.state().issue_tokens(acc.email);
            Json(json!({
                "message": "Login exitoso",
                "user": {
                    "id": acc.id,
                    "email": acc.email,
                    "first_name": acc.first_name,
                    "last_name": acc.last_name,
                    "role": acc.role
                },
                "tokens": tokens
            }))
            .into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Credenciales inválidas" }))).into_response(),
    }
}

async fn refresh(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    let mut state = stub.state();
    state.refresh_calls += 1;
    if state.refresh_disabled {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Refresh token inválido" }))).into_response();
    }
    let presented = body["refresh_token"].as_str().unwrap_or_default();
    match state.refresh_tokens.remove(presented) {
        Some(email) => Json(state.issue_tokens(email)).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Refresh token inválido" }))).into_response(),
    }
}

async fn profile(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("GET /auth/profile", &headers);
    let Some(acc) = stub.caller(&headers) else {
        return unauthorized();
    };
    Json(json!({
        "user": {
            "id": acc.id, "email": acc.email, "first_name": acc.first_name,
            "last_name": acc.last_name, "role": acc.role, "is_active": true
        },
        "employee": null
    }))
    .into_response()
}

async fn user_permissions(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("GET /permissions", &headers);
    let Some(acc) = stub.caller(&headers) else {
        return unauthorized();
    };
    Json(json!({ "role": acc.role, "permissions": permissions(acc.role) })).into_response()
}

async fn metrics(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("GET /dashboard/metrics", &headers);
    if stub.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "financial": [{ "metric_name": "Revenue", "metric_value": 250000.0, "recorded_date": "2024-06-01" }],
        "projects": { "total_projects": 6, "active_projects": 3, "completed_projects": 2, "avg_progress": 55.5 },
        "employees": { "total_employees": 12, "avg_performance": 4.1, "departments": 4 },
        "recent_activity": { "completed_tasks": 9 }
    }))
    .into_response()
}

async fn list_projects(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("GET /projects", &headers);
    if stub.state().projects_always_unauthorized || stub.caller(&headers).is_none() {
        return unauthorized();
    }

    let scripted = stub.state().project_script.pop_front();
    let (delay_ms, names) = scripted.unwrap_or((0, vec!["Portal Web", "Migración ERP"]));
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let projects: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| project_json(i as i64 + 1, name))
        .collect();
    Json(json!({
        "projects": projects,
        "pagination": { "page": 1, "per_page": 50, "has_more": false }
    }))
    .into_response()
}

async fn project_progress(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    stub.record("PUT /projects/:id/progress", &headers);
    if stub.caller(&headers).is_none() {
        return unauthorized();
    }
    let progress = body["progress"].as_f64().unwrap_or(-1.0);
    stub.state().progress_updates.push((id, progress));
    Json(json!({ "message": "Progreso actualizado exitosamente" })).into_response()
}

async fn list_users(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.record("GET /users", &headers);
    if stub.caller(&headers).is_none() {
        return unauthorized();
    }
    let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: i64 = params.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(20);

    // Two pages of data.
    let users: Vec<Value> = (0..2)
        .map(|i| {
            let id = (page - 1) * 2 + i + 10;
            json!({
                "id": id,
                "first_name": format!("Emp{id}"),
                "last_name": "Demo",
                "email": format!("emp{id}@demo.com"),
                "role": "employee",
                "department_name": if i == 0 { Value::from("Ventas") } else { Value::Null },
                "performance_score": 4.5
            })
        })
        .collect();

    Json(json!({
        "users": users,
        "pagination": { "page": page, "per_page": per_page, "has_more": page < 2 }
    }))
    .into_response()
}

async fn delete_user(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    stub.record("DELETE /users/:id", &headers);
    if stub.caller(&headers).is_none() {
        return unauthorized();
    }
    stub.state().deleted_users.push(id);
    Json(json!({ "message": "Usuario eliminado exitosamente" })).into_response()
}

async fn health(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.record("GET /health", &headers);
    Json(json!({
        "status": "healthy",
        "timestamp": "2024-06-01T10:00:00",
        "version": "1.0.0",
        "database": "connected"
    }))
    .into_response()
}

async fn fail(Path(kind): Path<String>) -> Response {
    match kind.as_str() {
        "error-field" => (StatusCode::BAD_REQUEST, Json(json!({ "error": "Email ya registrado" }))).into_response(),
        "message-field" => (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "Datos inválidos" }))).into_response(),
        "html" => (StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>").into_response(),
        _ => (StatusCode::OK, "not json").into_response(),
    }
}

fn router(stub: Stub) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/profile", get(profile))
        .route("/api/permissions", get(user_permissions))
        .route("/api/dashboard/metrics", get(metrics))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/:id/progress", put(project_progress))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", delete(delete_user))
        .route("/api/health", get(health))
        .route("/api/fail/:kind", get(fail))
        .with_state(stub)
}

pub struct TestServer {
    pub base_url: String,
    pub stub: Stub,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        init_tracing();
        let stub = Stub::default();
        let app = router(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, stub, handle }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        enterprisepro_observability::init_with(enterprisepro_observability::LogFormat::Pretty);
    });
}

pub struct Harness {
    pub server: TestServer,
    pub app: Arc<AppController>,
    pub shell: Arc<HeadlessShell>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub async fn new() -> Self {
        let server = TestServer::spawn().await;
        let config = server.config();
        Self::with_config(server, config).await
    }

    pub async fn with_config(server: TestServer, config: ClientConfig) -> Self {
        let shell = Arc::new(HeadlessShell::new());
        let store = Arc::new(MemoryStore::new());
        let app = AppController::new(&config, store.clone(), shell.clone()).unwrap();
        app.init().await.unwrap();
        Self { server, app, shell, store }
    }

    /// Log in through the form and land on the dashboard.
    pub async fn login_as(&self, email: &str) {
        let acc = account(email).expect("unknown demo account");
        let mut form = enterprisepro_client::LoginForm::new();
        form.email = acc.email.to_string();
        form.password = acc.password.to_string();
        assert!(self.app.submit_login(&mut form).await, "login failed: {:?}", form.error());
    }
}
