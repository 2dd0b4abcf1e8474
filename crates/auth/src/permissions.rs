use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque capability strings such as `"employee.create"`.
/// Matching is exact: there is no wildcard and no prefix matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const EMPLOYEE_CREATE: Permission = Permission(Cow::Borrowed("employee.create"));
    pub const EMPLOYEE_UPDATE: Permission = Permission(Cow::Borrowed("employee.update"));
    pub const EMPLOYEE_DELETE: Permission = Permission(Cow::Borrowed("employee.delete"));
    pub const PROJECT_CREATE: Permission = Permission(Cow::Borrowed("project.create"));
    pub const PROJECT_UPDATE: Permission = Permission(Cow::Borrowed("project.update"));
    pub const PROJECT_DELETE: Permission = Permission(Cow::Borrowed("project.delete"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The permission list loaded for the current session (`GET /permissions`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl<S: Into<Cow<'static, str>>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Permission::new).collect())
    }
}
