//! Client configuration loaded from the environment.
//!
//! Every variable is optional and prefixed with `ENTERPRISEPRO_`, e.g.
//! `ENTERPRISEPRO_API_BASE_URL=https://erp.example.com/api`. A `.env` file in
//! the working directory is honoured.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

const ENV_PREFIX: &str = "ENTERPRISEPRO_";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_projects_page_size")]
    pub projects_page_size: u32,

    #[serde(default = "default_employees_page_size")]
    pub employees_page_size: u32,

    /// Dashboard auto-refresh period.
    #[serde(default = "default_dashboard_refresh_secs")]
    pub dashboard_refresh_secs: u64,

    /// Idle time before the "continue session?" prompt.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Replay the request that hit a 401 once the token refresh succeeded.
    #[serde(default)]
    pub replay_after_refresh: bool,

    /// SQLite file backing the session store; defaults under the OS data dir.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_projects_page_size() -> u32 {
    50
}

fn default_employees_page_size() -> u32 {
    20
}

fn default_dashboard_refresh_secs() -> u64 {
    5 * 60
}

fn default_inactivity_timeout_secs() -> u64 {
    30 * 60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            projects_page_size: default_projects_page_size(),
            employees_page_size: default_employees_page_size(),
            dashboard_refresh_secs: default_dashboard_refresh_secs(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            replay_after_refresh: false,
            storage_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Build configuration from explicit key/value pairs (prefix included).
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config: ClientConfig = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("invalid ENTERPRISEPRO_* configuration")?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();

        if config.projects_page_size == 0 || config.employees_page_size == 0 {
            anyhow::bail!("page sizes must be greater than zero");
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dashboard_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_refresh_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    /// Resolve the SQLite session store path:
    /// `{app_data_dir}/enterprisepro/client.db` unless configured.
    pub fn resolved_storage_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }

        let mut dir = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;
        dir.push("enterprisepro");
        dir.push("client.db");
        Ok(dir)
    }
}
