//! Black-box session tests against a stub backend over real HTTP.

mod common;

use std::sync::Arc;

use reqwest::Method;

use common::{Harness, TestServer};
use enterprisepro_auth::Section;
use enterprisepro_client::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use enterprisepro_client::{
    ApiError, ClientConfig, ConnectivityState, KeyValueStore, LoginForm, NotificationLevel, View,
};

#[tokio::test]
async fn demo_login_lands_on_dashboard() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;

    assert!(h.app.auth().is_authenticated().await);
    assert_eq!(h.shell.view(), Some(View::MainApp));
    assert_eq!(
        h.shell.location(),
        Some(("dashboard".to_string(), "Dashboard - EnterprisePro".to_string()))
    );
    assert!(h.shell.has_notification(NotificationLevel::Success, "¡Bienvenido Admin!"));
    assert!(h.app.auth().has_permission("employee.delete").await);
    assert!(!h.shell.is_loading());

    let kpis = h.app.dashboard().kpis().await.expect("dashboard metrics loaded");
    assert_eq!(kpis.active_projects.text, "3");
    assert_eq!(kpis.total_employees.text, "12");
    assert_eq!(kpis.avg_progress.text, "55.5%");

    assert!(h.store.get(ACCESS_TOKEN_KEY).await.unwrap().is_some());
    assert!(h.store.get(REFRESH_TOKEN_KEY).await.unwrap().is_some());
    assert!(h.store.get(USER_DATA_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn wrong_password_is_rejected_without_refresh() {
    let h = Harness::new().await;
    let mut form = LoginForm::new();
    form.email = "admin@demo.com".into();
    form.password = "nope".into();

    assert!(!h.app.submit_login(&mut form).await);
    assert_eq!(form.error(), Some(LoginForm::BAD_CREDENTIALS));
    assert!(!h.app.auth().is_authenticated().await);
    assert_eq!(h.server.stub.refresh_calls(), 0);
    assert_eq!(h.shell.reload_count(), 1);
    assert!(!h.shell.is_loading());
}

#[tokio::test]
async fn session_survives_restart_with_shared_store() {
    let h = Harness::new().await;
    h.login_as("manager@demo.com").await;

    let shell = Arc::new(enterprisepro_client::HeadlessShell::new());
    let app = enterprisepro_client::AppController::new(&h.server.config(), h.store.clone(), shell.clone())
        .unwrap();
    app.init().await.unwrap();

    assert!(app.auth().is_authenticated().await);
    assert_eq!(shell.view(), Some(View::MainApp));
    assert!(app.auth().has_permission("project.create").await);
    assert!(!app.auth().has_permission("employee.delete").await);
}

#[tokio::test]
async fn expired_token_refreshes_once_without_replay() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;
    let before = h.app.api().token();
    let hits = h.server.stub.hits("GET /projects");

    h.server.stub.expire_access_tokens();
    let result = h.app.api().request(Method::GET, "/projects", None).await.unwrap();

    assert_eq!(result, None);
    assert_eq!(h.server.stub.refresh_calls(), 1);
    assert_eq!(h.server.stub.hits("GET /projects"), hits + 1);
    let after = h.app.api().token();
    assert!(after.is_some());
    assert_ne!(after, before);
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).await.unwrap(), after);
    assert_eq!(h.shell.reload_count(), 0);

    // The new token works for the next call.
    assert!(h.app.api().request(Method::GET, "/projects", None).await.unwrap().is_some());
}

#[tokio::test]
async fn replay_flag_retries_once_after_refresh() {
    let server = TestServer::spawn().await;
    let config = ClientConfig { replay_after_refresh: true, ..server.config() };
    let h = Harness::with_config(server, config).await;
    h.login_as("admin@demo.com").await;
    let hits = h.server.stub.hits("GET /projects");

    h.server.stub.expire_access_tokens();
    let result = h.app.api().request(Method::GET, "/projects", None).await.unwrap();

    let body = result.expect("replayed request returns data");
    assert_eq!(body["projects"].as_array().map(Vec::len), Some(2));
    assert_eq!(h.server.stub.refresh_calls(), 1);
    assert_eq!(h.server.stub.hits("GET /projects"), hits + 2);
}

#[tokio::test]
async fn failed_refresh_forces_logout() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;

    h.server.stub.expire_access_tokens();
    h.server.stub.state().refresh_disabled = true;
    let result = h.app.api().request(Method::GET, "/projects", None).await.unwrap();

    assert_eq!(result, None);
    assert_eq!(h.server.stub.refresh_calls(), 1);
    assert_eq!(h.shell.reload_count(), 1);
    assert_eq!(h.app.api().token(), None);
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY] {
        assert_eq!(h.store.get(key).await.unwrap(), None, "{key} should be cleared");
    }
    assert!(!h.app.auth().is_authenticated().await);
}

#[tokio::test]
async fn unauthorized_replay_forces_logout_without_second_refresh() {
    let server = TestServer::spawn().await;
    let config = ClientConfig { replay_after_refresh: true, ..server.config() };
    let h = Harness::with_config(server, config).await;
    h.login_as("admin@demo.com").await;

    h.server.stub.state().projects_always_unauthorized = true;
    let result = h.app.api().request(Method::GET, "/projects", None).await.unwrap();

    assert_eq!(result, None);
    assert_eq!(h.server.stub.refresh_calls(), 1);
    assert_eq!(h.shell.reload_count(), 1);
    assert_eq!(h.app.api().token(), None);
}

#[tokio::test]
async fn concurrent_expiry_costs_a_single_refresh() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;

    h.server.stub.expire_access_tokens();
    let api = h.app.api();
    let (a, b) = tokio::join!(
        api.request(Method::GET, "/projects", None),
        api.request(Method::GET, "/dashboard/metrics", None),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(h.server.stub.refresh_calls(), 1);
    assert_eq!(h.shell.reload_count(), 0);
    assert!(h.app.api().has_token());
    assert!(h.app.api().request(Method::GET, "/projects", None).await.unwrap().is_some());
}

#[tokio::test]
async fn logout_drops_dashboard_figures() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;
    assert!(h.app.dashboard().kpis().await.is_some());
    assert!(h.app.dashboard().is_auto_refreshing());

    h.app.logout().await.unwrap();

    assert!(h.app.dashboard().kpis().await.is_none());
    assert!(h.app.dashboard().metrics().await.is_none());
    assert!(!h.app.dashboard().is_auto_refreshing());
}

#[tokio::test]
async fn error_bodies_become_notifications() {
    let h = Harness::new().await;
    let api = h.app.api();

    let err = api.request(Method::GET, "/fail/error-field", None).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message(), "Email ya registrado");

    let err = api.request(Method::GET, "/fail/message-field", None).await.unwrap_err();
    assert_eq!(err.message(), "Datos inválidos");

    let err = api.request(Method::GET, "/fail/html", None).await.unwrap_err();
    assert_eq!(err.message(), "HTTP 500");

    let err = api.request(Method::GET, "/fail/not-json", None).await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));

    assert!(h.shell.has_notification(NotificationLevel::Error, "Email ya registrado"));
    assert!(h.shell.has_notification(NotificationLevel::Error, "HTTP 500"));
    assert!(!h.shell.is_loading());
}

#[tokio::test]
async fn connectivity_follows_transport() {
    let server = TestServer::spawn().await;
    let good = server.config();

    // Nothing listens on port 9 locally.
    let bad = ClientConfig { api_base_url: "http://127.0.0.1:9/api".into(), ..good.clone() };
    let h = Harness::with_config(server, bad).await;
    let err = h.app.api().health().await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(h.app.api().connectivity(), ConnectivityState::Offline);
    assert!(!h.shell.is_loading());

    let online = Harness::with_config(TestServer::spawn().await, good).await;
    let health = online.app.api().health().await.unwrap().expect("health body");
    assert!(health.is_healthy());
    assert_eq!(online.app.api().connectivity(), ConnectivityState::Online);
}

#[tokio::test]
async fn every_request_carries_a_request_id() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;

    let ids = h.server.stub.state().request_ids.clone();
    assert!(ids.len() >= 3, "login, permissions and metrics at least: {ids:?}");
    assert!(ids.iter().all(|id| uuid::Uuid::parse_str(id).is_ok()));
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn logout_clears_session_and_returns_to_login() {
    let h = Harness::new().await;
    h.login_as("employee@demo.com").await;

    h.app.logout().await.unwrap();

    assert!(!h.app.auth().is_authenticated().await);
    assert_eq!(h.shell.view(), Some(View::Login));
    assert!(h.shell.has_notification(NotificationLevel::Info, "Sesión cerrada exitosamente"));
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    assert!(!h.app.can_access_section(Section::Projects).await);
}

#[tokio::test]
async fn permissions_reload_replaces_snapshot() {
    let h = Harness::new().await;
    h.login_as("manager@demo.com").await;

    let user = h.app.auth().reload_permissions().await.unwrap().expect("profile loaded");
    assert_eq!(user.first_name, "María");
    assert!(user.has_permission("employee.update"));
    assert_eq!(h.server.stub.hits("GET /auth/profile"), 1);
    assert_eq!(h.server.stub.hits("GET /permissions"), 2);

    let cached: enterprisepro_auth::User = h
        .store
        .get(USER_DATA_KEY)
        .await
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
        .unwrap();
    assert_eq!(cached, user);
}

#[tokio::test]
async fn sqlite_backed_app_restores_session_across_opens() {
    let server = TestServer::spawn().await;
    let path = std::env::temp_dir().join(format!("enterprisepro-{}.db", uuid::Uuid::now_v7()));
    let config = ClientConfig { storage_path: Some(path.clone()), ..server.config() };

    let shell = Arc::new(enterprisepro_client::HeadlessShell::new());
    let app = enterprisepro_client::AppController::open(&config, shell.clone()).await.unwrap();
    app.init().await.unwrap();
    let mut form = LoginForm::new();
    form.prefill(&enterprisepro_client::DEMO_ACCOUNTS[0]);
    assert!(app.submit_login(&mut form).await);
    app.shutdown().await;
    drop(app);

    let shell = Arc::new(enterprisepro_client::HeadlessShell::new());
    let reopened = enterprisepro_client::AppController::open(&config, shell.clone()).await.unwrap();
    reopened.init().await.unwrap();
    assert!(reopened.auth().is_authenticated().await);
    assert_eq!(shell.view(), Some(View::MainApp));
    reopened.shutdown().await;

    let _ = std::fs::remove_file(&path);
}
