//! Dashboard aggregate metrics (`GET /dashboard/metrics`).
//!
//! Aggregates come straight from SQL `SUM`/`AVG`, so every numeric field may
//! be `null` on an empty database.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetric {
    pub metric_name: String,
    pub metric_value: f64,
    #[serde(default)]
    pub recorded_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    #[serde(default)]
    pub total_projects: Option<u64>,
    #[serde(default)]
    pub active_projects: Option<u64>,
    #[serde(default)]
    pub completed_projects: Option<u64>,
    #[serde(default)]
    pub avg_progress: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStats {
    #[serde(default)]
    pub total_employees: Option<u64>,
    #[serde(default)]
    pub avg_performance: Option<f64>,
    #[serde(default)]
    pub departments: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(default)]
    pub completed_tasks: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub current_time: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    #[serde(default)]
    pub online_users: Option<u64>,
    #[serde(default)]
    pub pending_notifications: Option<u64>,
    #[serde(default)]
    pub critical_alerts: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default)]
    pub financial: Vec<FinancialMetric>,
    #[serde(default)]
    pub projects: Option<ProjectStats>,
    #[serde(default)]
    pub employees: Option<EmployeeStats>,
    #[serde(default)]
    pub recent_activity: Option<RecentActivity>,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
    #[serde(default)]
    pub quick_stats: Option<QuickStats>,
}

impl DashboardMetrics {
    /// Latest value of a named financial metric (e.g. `"Revenue"`).
    pub fn financial_value(&self, name: &str) -> Option<f64> {
        self.financial
            .iter()
            .find(|m| m.metric_name == name)
            .map(|m| m.metric_value)
    }
}
