//! Presentation port.
//!
//! Services never touch a view directly; they call a [`Shell`]. A renderer
//! implements it; [`HeadlessShell`] records the calls instead.

use std::sync::{Mutex, MutexGuard};

use enterprisepro_auth::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Info => "info",
        }
    }
}

/// A transient toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Warning, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Info, message: message.into() }
    }
}

pub trait Shell: Send + Sync {
    /// Global loading indicator.
    fn set_loading(&self, loading: bool);

    fn notify(&self, notification: Notification);

    fn show_login(&self);

    fn show_main_app(&self, user: &User);

    /// Sync the address fragment and the page title.
    fn set_location(&self, fragment: &str, title: &str);

    /// Blocking yes/no prompt.
    fn confirm(&self, prompt: &str) -> bool;

    /// Full page reload, issued after a forced logout.
    fn reload(&self);

    fn set_sidebar_collapsed(&self, collapsed: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    MainApp,
}

#[derive(Debug)]
struct Recorded {
    loading: bool,
    loading_toggles: usize,
    notifications: Vec<Notification>,
    view: Option<View>,
    greeted_user: Option<String>,
    location: Option<(String, String)>,
    confirm_answer: bool,
    prompts: Vec<String>,
    reloads: usize,
    sidebar_collapsed: bool,
}

/// Shell that records every call. Used by tests and non-visual embeddings.
#[derive(Debug)]
pub struct HeadlessShell {
    inner: Mutex<Recorded>,
}

impl Default for HeadlessShell {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessShell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Recorded {
                loading: false,
                loading_toggles: 0,
                notifications: Vec::new(),
                view: None,
                greeted_user: None,
                location: None,
                confirm_answer: true,
                prompts: Vec::new(),
                reloads: 0,
                sidebar_collapsed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer returned by subsequent [`Shell::confirm`] calls.
    pub fn set_confirm_answer(&self, answer: bool) {
        self.state().confirm_answer = answer;
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Number of `set_loading(true)` calls so far.
    pub fn loading_toggles(&self) -> usize {
        self.state().loading_toggles
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.state().notifications.last().cloned()
    }

    pub fn has_notification(&self, level: NotificationLevel, message: &str) -> bool {
        self.state()
            .notifications
            .iter()
            .any(|n| n.level == level && n.message == message)
    }

    pub fn clear_notifications(&self) {
        self.state().notifications.clear();
    }

    pub fn view(&self) -> Option<View> {
        self.state().view
    }

    /// Email of the user the main app was last shown for.
    pub fn greeted_user(&self) -> Option<String> {
        self.state().greeted_user.clone()
    }

    /// Current `(fragment, title)`.
    pub fn location(&self) -> Option<(String, String)> {
        self.state().location.clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.state().reloads
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.state().sidebar_collapsed
    }
}

impl Shell for HeadlessShell {
    fn set_loading(&self, loading: bool) {
        let mut state = self.state();
        state.loading = loading;
        if loading {
            state.loading_toggles += 1;
        }
    }

    fn notify(&self, notification: Notification) {
        tracing::info!(level = notification.level.as_str(), message = %notification.message, "notification");
        self.state().notifications.push(notification);
    }

    fn show_login(&self) {
        tracing::debug!("showing login view");
        let mut state = self.state();
        state.view = Some(View::Login);
        state.greeted_user = None;
    }

    fn show_main_app(&self, user: &User) {
        tracing::debug!(user_id = %user.id, "showing main app");
        let mut state = self.state();
        state.view = Some(View::MainApp);
        state.greeted_user = Some(user.email.clone());
    }

    fn set_location(&self, fragment: &str, title: &str) {
        self.state().location = Some((fragment.to_string(), title.to_string()));
    }

    fn confirm(&self, prompt: &str) -> bool {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());
        state.confirm_answer
    }

    fn reload(&self) {
        tracing::info!("page reload requested");
        self.state().reloads += 1;
    }

    fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.state().sidebar_collapsed = collapsed;
    }
}
