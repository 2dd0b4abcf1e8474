//! Dashboard section: KPI cards, activity feed and periodic refresh.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use enterprisepro_auth::Section;
use enterprisepro_core::DashboardMetrics;

use super::{LoadTicket, LoadTickets, SectionManager};
use crate::api::ApiClient;
use crate::auth::AuthManager;
use crate::error::ApiError;
use crate::format::{counter_frames, format_currency, format_relative_time};
use crate::shell::Notification;

pub const REVENUE_METRIC: &str = "Revenue";
pub const MAX_ACTIVITY_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiKind {
    Currency,
    Count,
    Percent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard {
    pub label: &'static str,
    pub kind: KpiKind,
    pub value: f64,
    /// Final text once any animation has finished.
    pub text: String,
}

impl KpiCard {
    fn new(label: &'static str, kind: KpiKind, value: f64) -> Self {
        let text = match kind {
            KpiKind::Currency => format_currency(value),
            KpiKind::Count => format!("{}", value.max(0.0).floor() as u64),
            KpiKind::Percent => format!("{value:.1}%"),
        };
        Self { label, kind, value, text }
    }

    /// Counter animation from zero; the last frame is always [`KpiCard::text`].
    pub fn animation_frames(&self, frames: usize) -> Vec<String> {
        let values = counter_frames(0.0, self.value, frames);
        let last = values.len().saturating_sub(1);
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                if i == last {
                    return self.text.clone();
                }
                match self.kind {
                    KpiKind::Currency => format!("${}", v.floor()),
                    KpiKind::Count => format!("{}", v.floor()),
                    KpiKind::Percent => format!("{v:.1}%"),
                }
            })
            .collect()
    }
}

/// The four headline cards.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCards {
    pub revenue: KpiCard,
    pub active_projects: KpiCard,
    pub total_employees: KpiCard,
    pub avg_progress: KpiCard,
}

impl KpiCards {
    pub fn from_metrics(metrics: &DashboardMetrics) -> Self {
        let projects = metrics.projects.clone().unwrap_or_default();
        let employees = metrics.employees.clone().unwrap_or_default();

        Self {
            revenue: KpiCard::new(
                "Ingresos",
                KpiKind::Currency,
                metrics.financial_value(REVENUE_METRIC).unwrap_or(0.0),
            ),
            active_projects: KpiCard::new(
                "Proyectos activos",
                KpiKind::Count,
                projects.active_projects.unwrap_or(0) as f64,
            ),
            total_employees: KpiCard::new(
                "Empleados",
                KpiKind::Count,
                employees.total_employees.unwrap_or(0) as f64,
            ),
            avg_progress: KpiCard::new(
                "Progreso promedio",
                KpiKind::Percent,
                projects.avg_progress.unwrap_or(0.0),
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &KpiCard> {
        [
            &self.revenue,
            &self.active_projects,
            &self.total_employees,
            &self.avg_progress,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    pub title: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

impl ActivityItem {
    pub fn relative_time(&self, now: DateTime<Utc>) -> String {
        format_relative_time(self.at, now)
    }
}

#[derive(Debug, Default)]
struct DashboardState {
    metrics: Option<DashboardMetrics>,
    kpis: Option<KpiCards>,
    activity: VecDeque<ActivityItem>,
    refreshes: u64,
}

pub struct DashboardManager {
    me: Weak<DashboardManager>,
    api: Arc<ApiClient>,
    auth: Arc<AuthManager>,
    refresh_interval: Duration,
    tickets: LoadTickets,
    state: Mutex<DashboardState>,
    refresh_task: StdMutex<Option<JoinHandle<()>>>,
    refresh_loops_started: AtomicUsize,
}

impl DashboardManager {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthManager>, refresh_interval: Duration) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            api,
            auth,
            refresh_interval,
            tickets: LoadTickets::new(),
            state: Mutex::new(DashboardState::default()),
            refresh_task: StdMutex::new(None),
            refresh_loops_started: AtomicUsize::new(0),
        })
    }

    /// Load metrics, rebuild the KPI cards and make sure auto-refresh runs.
    pub async fn load_dashboard(&self) -> Result<(), ApiError> {
        if !self.auth.is_authenticated().await {
            return Ok(());
        }

        match self.fetch().await {
            Ok(true) => {
                self.start_auto_refresh();
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "failed to load dashboard");
                self.api
                    .shell()
                    .notify(Notification::error("Error al cargar el dashboard"));
                Err(err)
            }
        }
    }

    /// Background re-fetch; failures are logged only.
    pub async fn refresh_metrics(&self) {
        if !self.auth.is_authenticated().await {
            return;
        }
        if let Err(err) = self.fetch().await {
            tracing::warn!(error = %err, "dashboard refresh failed");
        }
    }

    async fn fetch(&self) -> Result<bool, ApiError> {
        let ticket = self.tickets.issue();
        match self.api.dashboard_metrics().await? {
            Some(metrics) => Ok(self.apply_metrics(ticket, metrics).await),
            None => Ok(false),
        }
    }

    /// Store fetched metrics if `ticket` is still the latest load.
    pub async fn apply_metrics(&self, ticket: LoadTicket, metrics: DashboardMetrics) -> bool {
        let mut state = self.state.lock().await;
        if !self.tickets.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale dashboard metrics");
            return false;
        }
        state.kpis = Some(KpiCards::from_metrics(&metrics));
        state.metrics = Some(metrics);
        state.refreshes += 1;
        true
    }

    pub fn issue_ticket(&self) -> LoadTicket {
        self.tickets.issue()
    }

    pub async fn kpis(&self) -> Option<KpiCards> {
        self.state.lock().await.kpis.clone()
    }

    pub async fn metrics(&self) -> Option<DashboardMetrics> {
        self.state.lock().await.metrics.clone()
    }

    /// Number of metric snapshots applied so far.
    pub async fn refresh_count(&self) -> u64 {
        self.state.lock().await.refreshes
    }

    /// Prepend to the activity feed, keeping the newest ten.
    pub async fn push_activity(&self, item: ActivityItem) {
        let mut state = self.state.lock().await;
        state.activity.push_front(item);
        state.activity.truncate(MAX_ACTIVITY_ITEMS);
    }

    pub async fn activity(&self) -> Vec<ActivityItem> {
        self.state.lock().await.activity.iter().cloned().collect()
    }

    fn task_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.refresh_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the periodic refresh; a no-op while one is already running.
    pub fn start_auto_refresh(&self) {
        let mut slot = self.task_slot();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let me = self.me.clone();
        let period = self.refresh_interval.max(Duration::from_secs(1));
        tracing::debug!(?period, "starting dashboard auto-refresh");

        self.refresh_loops_started.fetch_add(1, Ordering::Relaxed);
        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = me.upgrade() else {
                    break;
                };
                manager.refresh_metrics().await;
            }
        }));
    }

    pub fn stop_auto_refresh(&self) {
        if let Some(task) = self.task_slot().take() {
            tracing::debug!("stopping dashboard auto-refresh");
            task.abort();
        }
    }

    /// How many refresh loops have been spawned over this manager's lifetime.
    pub fn refresh_loops_started(&self) -> usize {
        self.refresh_loops_started.load(Ordering::Relaxed)
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.task_slot()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for DashboardManager {
    fn drop(&mut self) {
        self.stop_auto_refresh();
    }
}

#[async_trait::async_trait]
impl SectionManager for DashboardManager {
    fn section(&self) -> Section {
        Section::Dashboard
    }

    async fn load(&self) -> Result<(), ApiError> {
        self.load_dashboard().await
    }

    /// Stop refreshing and forget the session's metrics and activity.
    async fn cleanup(&self) {
        self.stop_auto_refresh();
        let mut state = self.state.lock().await;
        self.tickets.issue();
        *state = DashboardState::default();
    }
}
