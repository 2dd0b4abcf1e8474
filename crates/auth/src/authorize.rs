use thiserror::Error;

use crate::{Section, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: role may not open section '{0}'")]
    SectionDenied(Section),
}

impl AuthzError {
    /// Warning shown to the user when an action or route is blocked.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthzError::Unauthenticated => "Debes iniciar sesión para continuar",
            AuthzError::Forbidden(_) => "No tienes permisos para realizar esta acción",
            AuthzError::SectionDenied(_) => "No tienes permisos para acceder a esta sección",
        }
    }
}

/// Gate an action on an exact permission of the current user.
///
/// - No IO
/// - No panics
/// - Pure policy check
pub fn authorize(user: Option<&User>, required: &str) -> Result<(), AuthzError> {
    let user = user.ok_or(AuthzError::Unauthenticated)?;

    if user.has_permission(required) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, permission = required, "permission denied");
        Err(AuthzError::Forbidden(required.to_string()))
    }
}

/// Gate navigation on the static role → section table.
pub fn authorize_section(user: Option<&User>, section: Section) -> Result<(), AuthzError> {
    let user = user.ok_or(AuthzError::Unauthenticated)?;

    if section.is_allowed_for(&user.role) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, %section, "section denied");
        Err(AuthzError::SectionDenied(section))
    }
}
