use crate::error::{PulseError, Result};
use crate::window::Window;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// Owner and name of a GitHub repository, used as opaque path segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();
        if owner.is_empty() || repo.is_empty() {
            return Err(PulseError::InvalidUrl(format!(
                "owner and repository must be non-empty (got '{owner}/{repo}')"
            )));
        }
        Ok(Self { owner, repo })
    }

    /// Accepts `[scheme://]github.com/<owner>/<repo>[/...]` or a bare `<owner>/<repo>`.
    pub fn from_url(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let rest = match trimmed.split_once("github.com/") {
            Some((_, rest)) => rest,
            None => trimmed,
        };
        let mut parts = rest.trim_start_matches('/').split('/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default();
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        Self::new(owner, repo).map_err(|_| {
            PulseError::InvalidUrl(format!("cannot find <owner>/<repo> in '{trimmed}'"))
        })
    }

    pub fn collection_path(&self, collection: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner, self.repo, collection)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Open,
    Closed,
    Old,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Open => "open",
            Label::Closed => "closed",
            Label::Old => "old",
        }
    }
}

/// Pull request / issue state as understood by the `state` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::Open => "open",
            ItemState::Closed => "closed",
        }
    }

    pub fn label(self) -> Label {
        match self {
            ItemState::Open => Label::Open,
            ItemState::Closed => Label::Closed,
        }
    }
}

/// Counts keyed by a small fixed label set. Missing labels read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCounter(BTreeMap<Label, u64>);

impl CategoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, label: Label) {
        *self.0.entry(label).or_insert(0) += 1;
    }

    pub fn get(&self, label: Label) -> u64 {
        self.0.get(&label).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, u64)> + '_ {
        self.0.iter().map(|(label, count)| (*label, *count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    pub login: String,
    pub commits: u64,
}

/// Commit counts per author login, remembering the order logins were first seen.
#[derive(Debug, Clone, Default)]
pub struct ActivityTally {
    entries: Vec<UserActivity>,
    index: HashMap<String, usize>,
}

impl ActivityTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, login: &str) {
        match self.index.get(login) {
            Some(&pos) => self.entries[pos].commits += 1,
            None => {
                self.index.insert(login.to_string(), self.entries.len());
                self.entries.push(UserActivity {
                    login: login.to_string(),
                    commits: 1,
                });
            }
        }
    }

    pub fn count(&self, login: &str) -> u64 {
        self.index
            .get(login)
            .map(|&pos| self.entries[pos].commits)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `n` authors by commit count; the stable sort keeps first-seen order for ties.
    pub fn top(&self, n: usize) -> Vec<UserActivity> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.commits.cmp(&a.commits));
        ranked.truncate(n);
        ranked
    }
}

/// A non-fatal anomaly met while scanning a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    Timeout {
        page: u32,
    },
    ConnectionUnusable {
        page: u32,
        detail: String,
    },
    /// The API answered with something other than a list, usually an error object.
    ApiError {
        page: u32,
        status: u16,
        payload: Value,
    },
    InvalidBody {
        page: u32,
        status: u16,
        body: String,
    },
    MalformedItem {
        reason: String,
        item_id: Option<String>,
    },
    Cancelled {
        page: u32,
    },
}

impl Problem {
    pub fn malformed(reason: impl Into<String>, item: &Value) -> Self {
        let item_id = ["number", "sha", "id"]
            .iter()
            .find_map(|key| item.get(key))
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        Problem::MalformedItem {
            reason: reason.into(),
            item_id,
        }
    }

    /// Whether this problem ended the scan (as opposed to skipping one item).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Problem::MalformedItem { .. })
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Timeout { page } => write!(f, "request timed out (page {page})"),
            Problem::ConnectionUnusable { page, .. } => {
                write!(f, "connection unusable for a new request (page {page})")
            }
            Problem::ApiError {
                page,
                status,
                payload,
            } => write!(f, "API error {status} on page {page}: {payload}"),
            Problem::InvalidBody { page, status, body } => {
                write!(f, "non-JSON response {status} on page {page}: {body}")
            }
            Problem::MalformedItem { reason, item_id } => match item_id {
                Some(id) => write!(f, "malformed item {id}: {reason}"),
                None => write!(f, "malformed item: {reason}"),
            },
            Problem::Cancelled { page } => write!(f, "scan cancelled before page {page}"),
        }
    }
}

/// Result of one aggregator invocation: definite counts plus whatever went wrong.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryReport<C> {
    pub counts: C,
    pub problems: Vec<Problem>,
}

impl<C> CategoryReport<C> {
    pub fn map<D>(self, f: impl FnOnce(C) -> D) -> CategoryReport<D> {
        CategoryReport {
            counts: f(self.counts),
            problems: self.problems,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoReport {
    pub active_users: CategoryReport<Vec<UserActivity>>,
    pub open_pulls: CategoryReport<CategoryCounter>,
    pub closed_pulls: CategoryReport<CategoryCounter>,
    pub stale_pulls: CategoryReport<CategoryCounter>,
    pub open_issues: CategoryReport<CategoryCounter>,
    pub closed_issues: CategoryReport<CategoryCounter>,
    pub stale_issues: CategoryReport<CategoryCounter>,
}

impl RepoReport {
    /// Problems of every category, tagged with the category name.
    pub fn problems(&self) -> Vec<(&'static str, &Problem)> {
        let counters = [
            ("open pull requests", &self.open_pulls),
            ("closed pull requests", &self.closed_pulls),
            ("old pull requests", &self.stale_pulls),
            ("open issues", &self.open_issues),
            ("closed issues", &self.closed_issues),
            ("old issues", &self.stale_issues),
        ];
        self.active_users
            .problems
            .iter()
            .map(|p| ("active users", p))
            .chain(
                counters
                    .into_iter()
                    .flat_map(|(name, report)| report.problems.iter().map(move |p| (name, p))),
            )
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub branch: Option<String>,
    pub window: Window,
    pub report: RepoReport,
}
