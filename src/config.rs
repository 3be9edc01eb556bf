//! Engine settings and credential loading.
//!
//! Settings come from an optional TOML file, by default
//! `<config dir>/ghpulse/config.toml`:
//!
//! ```toml
//! [auth]
//! username = "octocat"
//! token = "ghp_..."        # or GHPULSE_TOKEN
//!
//! [api]
//! base_url = "https://api.github.com"
//! timeout = "5s"
//!
//! [report]
//! top_users = 30
//! stale_pull_days = 30
//! stale_issue_days = 14
//! ```
//!
//! A missing file only means "anonymous, defaults".

use crate::error::{PulseError, Result};
use base64::{engine::general_purpose, Engine as _};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TOP_USERS: usize = 30;
pub const DEFAULT_STALE_PULL_DAYS: i64 = 30;
pub const DEFAULT_STALE_ISSUE_DAYS: i64 = 14;

pub const ENV_USERNAME: &str = "GHPULSE_USERNAME";
pub const ENV_TOKEN: &str = "GHPULSE_TOKEN";

/// Everything the engine needs to know that is not per-call input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub base_url: String,
    /// Page size requested from the API; a shorter page marks the end of a collection.
    pub per_page: usize,
    /// Per-request connect and read timeout.
    pub timeout: Duration,
    pub user_agent: String,
    pub top_users: usize,
    pub stale_pull_days: i64,
    pub stale_issue_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("ghpulse/", env!("CARGO_PKG_VERSION")).to_string(),
            top_users: DEFAULT_TOP_USERS,
            stale_pull_days: DEFAULT_STALE_PULL_DAYS,
            stale_issue_days: DEFAULT_STALE_ISSUE_DAYS,
        }
    }
}

/// Pre-encoded HTTP Basic credential (`base64(user:token)`).
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredential(String);

impl AuthCredential {
    pub fn basic(username: &str, token: &str) -> Self {
        Self(general_purpose::STANDARD.encode(format!("{username}:{token}")))
    }

    pub fn encoded(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthCredential(<redacted>)")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub auth: AuthSection,
    pub api: ApiSection,
    pub report: ReportSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub username: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: Option<String>,
    /// Humantime duration, e.g. `"5s"` or `"1m 30s"`.
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub top_users: Option<usize>,
    pub stale_pull_days: Option<i64>,
    pub stale_issue_days: Option<i64>,
}

impl FileConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ghpulse").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load `path` (or the default location). An unreadable file is logged and
    /// replaced by defaults; a file that exists but does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            warn!("no configuration directory available, continuing without credentials");
            return Ok(Self::default());
        };

        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(config_path = ?path, "loading configuration");
                Self::parse(&text)
            }
            Err(e) => {
                warn!(
                    config_path = ?path,
                    error = %e,
                    "configuration unavailable, continuing without credentials"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Let `GHPULSE_USERNAME` / `GHPULSE_TOKEN` override the file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(username) = lookup(ENV_USERNAME).filter(|v| !v.is_empty()) {
            self.auth.username = Some(username);
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.auth.token = Some(token);
        }
        self
    }

    pub fn credential(&self) -> Option<AuthCredential> {
        match (self.auth.username.as_deref(), self.auth.token.as_deref()) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => {
                Some(AuthCredential::basic(user, token))
            }
            (None, None) => None,
            _ => {
                warn!(
                    "both auth.username and auth.token are required, \
                     continuing without credentials"
                );
                None
            }
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(base_url) = &self.api.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = &self.api.timeout {
            config.timeout = humantime::parse_duration(timeout)?;
        }
        if let Some(top) = self.report.top_users {
            config.top_users = top;
        }
        if let Some(days) = self.report.stale_pull_days {
            config.stale_pull_days = stale_days("report.stale_pull_days", days)?;
        }
        if let Some(days) = self.report.stale_issue_days {
            config.stale_issue_days = stale_days("report.stale_issue_days", days)?;
        }

        Ok(config)
    }
}

const MAX_STALE_DAYS: i64 = 36_500;

fn stale_days(key: &str, value: i64) -> Result<i64> {
    if !(0..=MAX_STALE_DAYS).contains(&value) {
        return Err(PulseError::Config(format!(
            "{key} must be between 0 and {MAX_STALE_DAYS} (got {value})"
        )));
    }
    Ok(value)
}
