//! Black-box section tests: navigation, lists, pagination and gated actions.

mod common;

use std::time::Duration;

use common::Harness;
use enterprisepro_auth::Section;
use enterprisepro_client::{ActionError, KeyEvent, KeyOutcome, NotificationLevel, SectionManager};
use enterprisepro_core::{ProjectId, UserId};

#[tokio::test]
async fn newer_project_load_wins_over_slow_one() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;
    {
        let mut state = h.server.stub.state();
        state.project_script.push_back((300, vec!["Antiguo"]));
        state.project_script.push_back((0, vec!["Nuevo A", "Nuevo B"]));
    }

    let projects = h.app.projects().clone();
    let slow = tokio::spawn(async move { projects.load_projects().await });

    // Wait until the slow request has taken its script entry.
    while h.server.stub.state().project_script.len() > 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    h.app.projects().load_projects().await.unwrap();
    slow.await.unwrap().unwrap();

    let names: Vec<String> = h.app.projects().projects().await.into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Nuevo A", "Nuevo B"]);
}

#[tokio::test]
async fn load_finishing_after_logout_is_discarded() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;
    h.server.stub.state().project_script.push_back((300, vec!["Fantasma"]));

    let projects = h.app.projects().clone();
    let slow = tokio::spawn(async move { projects.load_projects().await });
    while !h.server.stub.state().project_script.is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    h.app.logout().await.unwrap();
    slow.await.unwrap().unwrap();

    assert!(h.app.projects().projects().await.is_empty());
    assert!(h.app.projects().cards().await.is_empty());
}

#[tokio::test]
async fn project_search_filters_loaded_list() {
    let h = Harness::new().await;
    h.login_as("manager@demo.com").await;
    assert!(h.app.show_section(Section::Projects).await);
    assert_eq!(h.app.active_section().await, Section::Projects);
    assert_eq!(
        h.shell.location(),
        Some(("projects".to_string(), "Proyectos - EnterprisePro".to_string()))
    );

    h.app.projects().set_search("PORTAL").await;
    let filtered = h.app.projects().filtered().await;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].name, "Portal Web");
    assert_eq!(h.app.projects().cards().await.len(), 1);
}

#[tokio::test]
async fn progress_update_is_validated_and_sent() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;

    assert!(h.app.projects().update_progress(ProjectId::new(1), 75.0).await.unwrap());
    assert_eq!(h.server.stub.state().progress_updates, vec![(1, 75.0)]);
    assert!(h.shell.has_notification(NotificationLevel::Success, "Progreso actualizado exitosamente"));

    let err = h.app.projects().update_progress(ProjectId::new(1), 150.0).await.unwrap_err();
    assert!(matches!(err, ActionError::Api(_)));
    assert_eq!(h.server.stub.hits("PUT /projects/:id/progress"), 1);
}

#[tokio::test]
async fn employee_pages_follow_server_pagination() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;
    assert!(h.app.show_section(Section::Employees).await);

    let employees = h.app.employees();
    assert_eq!(employees.page().await, 1);
    assert!(employees.has_more().await);
    let rows = employees.rows().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].department, "Ventas");
    assert_eq!(rows[1].department, "Sin asignar");
    assert_eq!(rows[0].score, "4.5");
    assert!(rows.iter().all(|r| r.can_edit && r.can_delete));

    assert!(employees.next_page().await.unwrap());
    assert_eq!(employees.page().await, 2);
    assert!(!employees.has_more().await);
    assert_eq!(employees.employees().await[0].id, UserId::new(12));

    assert!(!employees.next_page().await.unwrap());
    assert!(employees.previous_page().await.unwrap());
    assert_eq!(employees.page().await, 1);
    assert!(!employees.previous_page().await.unwrap());
}

#[tokio::test]
async fn employee_delete_needs_confirmation() {
    let h = Harness::new().await;
    h.login_as("admin@demo.com").await;
    h.app.employees().load().await.unwrap();

    h.shell.set_confirm_answer(false);
    let err = h.app.employees().delete(UserId::new(10)).await.unwrap_err();
    assert!(matches!(err, ActionError::Cancelled));
    assert_eq!(h.server.stub.hits("DELETE /users/:id"), 0);
    assert_eq!(
        h.shell.prompts().last().map(String::as_str),
        Some("¿Estás seguro de que deseas eliminar a Emp10 Demo?")
    );

    h.shell.set_confirm_answer(true);
    assert!(h.app.employees().delete(UserId::new(10)).await.unwrap());
    assert_eq!(h.server.stub.state().deleted_users, vec![10]);
    assert!(h.shell.has_notification(NotificationLevel::Success, "Empleado eliminado exitosamente"));
}

#[tokio::test]
async fn employee_role_is_kept_out_of_employee_management() {
    let h = Harness::new().await;
    h.login_as("employee@demo.com").await;

    assert!(!h.app.show_section(Section::Employees).await);
    assert_eq!(h.app.active_section().await, Section::Dashboard);
    assert!(h.shell.has_notification(
        NotificationLevel::Warning,
        "No tienes permisos para acceder a esta sección"
    ));

    let err = h.app.employees().delete(UserId::new(10)).await.unwrap_err();
    assert!(matches!(err, ActionError::Denied(_)));
    assert!(h.shell.has_notification(
        NotificationLevel::Warning,
        "No tienes permisos para realizar esta acción"
    ));
    assert_eq!(h.server.stub.hits("DELETE /users/:id"), 0);

    assert_eq!(h.app.handle_key(&KeyEvent::alt("e")).await, KeyOutcome::Ignored);
    assert!(!h.app.handle_fragment_change("#employees").await);
    assert!(h.app.auth().menu().await.iter().all(|item| item.section != Section::Employees));
}

#[tokio::test]
async fn keyboard_shortcuts_navigate() {
    let h = Harness::new().await;
    h.login_as("manager@demo.com").await;

    assert_eq!(
        h.app.handle_key(&KeyEvent::alt("p")).await,
        KeyOutcome::Navigated(Section::Projects)
    );
    assert_eq!(h.app.active_section().await, Section::Projects);
    assert!(!h.app.projects().projects().await.is_empty());

    assert!(h.app.handle_fragment_change("#dashboard").await);
    assert_eq!(h.app.active_section().await, Section::Dashboard);
}
