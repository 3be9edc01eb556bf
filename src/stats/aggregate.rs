use crate::api::{CancelToken, Collection, PageItem, Paginator, Transport};
use crate::config::{AuthCredential, EngineConfig};
use crate::model::{
    ActivityTally, CategoryCounter, CategoryReport, ItemState, Label, Problem, RepoId, RepoReport,
    UserActivity,
};
use crate::window::{parse_api_timestamp, Classification, ScanPolicy, Window};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info};

pub type Record = Map<String, Value>;

/// One traversal: which collection, with which query, under which window policy.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub collection: Collection,
    pub query: Vec<(String, String)>,
    pub policy: ScanPolicy,
}

/// Fetch-and-aggregate engine for one repository.
pub struct Analyzer<T> {
    transport: T,
    repo: RepoId,
    config: EngineConfig,
    credential: Option<AuthCredential>,
    cancel: CancelToken,
}

impl<T: Transport> Analyzer<T> {
    pub fn new(transport: T, repo: RepoId, config: EngineConfig) -> Self {
        Self {
            transport,
            repo,
            config,
            credential: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_credential(mut self, credential: Option<AuthCredential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drive one traversal, feeding every counted record to `rule`.
    ///
    /// Under [`ScanPolicy::ClientWindow`] the rule receives the parsed
    /// `created_at` of in-window records only, and the first record older
    /// than the window start ends the traversal. Records that are not
    /// objects or carry no parseable `created_at` become problems and are
    /// skipped without affecting that decision.
    pub fn scan<C>(
        &self,
        request: ScanRequest,
        counts: C,
        mut rule: impl FnMut(&mut C, &Record, Option<&DateTime<Utc>>),
    ) -> CategoryReport<C> {
        let paginator = Paginator::new(&self.transport, self.config.per_page)
            .with_credential(self.credential.as_ref())
            .with_cancel(&self.cancel);
        let collection = request.collection.as_str();
        let pages = paginator.paginate(self.repo.collection_path(collection), request.query);

        let mut report = CategoryReport {
            counts,
            problems: Vec::new(),
        };
        let mut counted = 0usize;

        for item in pages {
            let record = match item {
                PageItem::Record(record) => record,
                PageItem::Problem(problem) => {
                    report.problems.push(problem);
                    continue;
                }
            };

            let Some(fields) = record.as_object() else {
                report
                    .problems
                    .push(Problem::malformed("record is not an object", &record));
                continue;
            };

            let created = match request.policy {
                ScanPolicy::ServerFiltered => None,
                ScanPolicy::ClientWindow(window) => {
                    let created = match created_at(fields) {
                        Ok(created) => created,
                        Err(reason) => {
                            report.problems.push(Problem::malformed(reason, &record));
                            continue;
                        }
                    };
                    match window.classify(&created) {
                        Classification::InWindow => Some(created),
                        Classification::OutOfWindow { may_stop: false } => continue,
                        Classification::OutOfWindow { may_stop: true } => {
                            debug!(
                                collection,
                                created_at = %created,
                                "crossed window start, stopping scan"
                            );
                            break;
                        }
                    }
                }
            };

            rule(&mut report.counts, fields, created.as_ref());
            counted += 1;
        }

        info!(
            repo = %self.repo,
            collection,
            counted,
            problems = report.problems.len(),
            "scan finished"
        );
        report
    }

    /// Commit counts per author login. Branch and window are filtered by the API.
    pub fn active_users(
        &self,
        window: &Window,
        branch: Option<&str>,
    ) -> CategoryReport<ActivityTally> {
        let mut query = Vec::new();
        if let Some(branch) = branch {
            query.push(("sha".to_string(), branch.to_string()));
        }
        query.extend(
            window
                .server_params()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );

        let request = ScanRequest {
            collection: Collection::Commits,
            query,
            policy: ScanPolicy::ServerFiltered,
        };
        self.scan(request, ActivityTally::new(), |tally, commit, _| {
            if let Some(login) = author_login(commit) {
                tally.record(login);
            }
        })
    }

    /// The `top_users` most active authors, ties in first-seen order.
    pub fn top_users(
        &self,
        window: &Window,
        branch: Option<&str>,
    ) -> CategoryReport<Vec<UserActivity>> {
        let top = self.config.top_users;
        self.active_users(window, branch).map(|tally| tally.top(top))
    }

    pub fn pulls(
        &self,
        state: ItemState,
        window: &Window,
        branch: Option<&str>,
    ) -> CategoryReport<CategoryCounter> {
        let mut query = listing_query(state);
        if let Some(branch) = branch {
            query.push(("base".to_string(), branch.to_string()));
        }
        self.count_state(Collection::Pulls, query, state, window)
    }

    pub fn issues(&self, state: ItemState, window: &Window) -> CategoryReport<CategoryCounter> {
        let mut query = listing_query(state);
        query.push(("filter".to_string(), "all".to_string()));
        self.count_state(Collection::Issues, query, state, window)
    }

    /// Open pull requests older than `stale_pull_days` at `now`.
    pub fn stale_pulls(
        &self,
        window: &Window,
        branch: Option<&str>,
        now: DateTime<Utc>,
    ) -> CategoryReport<CategoryCounter> {
        let mut query = listing_query(ItemState::Open);
        if let Some(branch) = branch {
            query.push(("base".to_string(), branch.to_string()));
        }
        self.count_stale(Collection::Pulls, query, window, now, self.config.stale_pull_days)
    }

    /// Open issues older than `stale_issue_days` at `now`.
    pub fn stale_issues(
        &self,
        window: &Window,
        now: DateTime<Utc>,
    ) -> CategoryReport<CategoryCounter> {
        let mut query = listing_query(ItemState::Open);
        query.push(("filter".to_string(), "all".to_string()));
        self.count_stale(Collection::Issues, query, window, now, self.config.stale_issue_days)
    }

    pub fn report(&self, window: &Window, branch: Option<&str>, now: DateTime<Utc>) -> RepoReport {
        self.report_with_progress(window, branch, now, |_| {})
    }

    /// Run every category in turn; `on_category` is told which one is about to start.
    pub fn report_with_progress(
        &self,
        window: &Window,
        branch: Option<&str>,
        now: DateTime<Utc>,
        mut on_category: impl FnMut(&'static str),
    ) -> RepoReport {
        on_category("active users");
        let active_users = self.top_users(window, branch);
        on_category("open pull requests");
        let open_pulls = self.pulls(ItemState::Open, window, branch);
        on_category("closed pull requests");
        let closed_pulls = self.pulls(ItemState::Closed, window, branch);
        on_category("old pull requests");
        let stale_pulls = self.stale_pulls(window, branch, now);
        on_category("open issues");
        let open_issues = self.issues(ItemState::Open, window);
        on_category("closed issues");
        let closed_issues = self.issues(ItemState::Closed, window);
        on_category("old issues");
        let stale_issues = self.stale_issues(window, now);

        RepoReport {
            active_users,
            open_pulls,
            closed_pulls,
            stale_pulls,
            open_issues,
            closed_issues,
            stale_issues,
        }
    }

    fn count_state(
        &self,
        collection: Collection,
        query: Vec<(String, String)>,
        state: ItemState,
        window: &Window,
    ) -> CategoryReport<CategoryCounter> {
        let request = ScanRequest {
            collection,
            query,
            policy: ScanPolicy::ClientWindow(*window),
        };
        let label = state.label();
        self.scan(request, CategoryCounter::new(), |counter, _, _| counter.increment(label))
    }

    fn count_stale(
        &self,
        collection: Collection,
        query: Vec<(String, String)>,
        window: &Window,
        now: DateTime<Utc>,
        threshold_days: i64,
    ) -> CategoryReport<CategoryCounter> {
        let request = ScanRequest {
            collection,
            query,
            policy: ScanPolicy::ClientWindow(*window),
        };
        let threshold = Duration::days(threshold_days);
        self.scan(request, CategoryCounter::new(), |counter, _, created| {
            if let Some(created) = created {
                if now.signed_duration_since(*created) > threshold {
                    counter.increment(Label::Old);
                }
            }
        })
    }
}

fn listing_query(state: ItemState) -> Vec<(String, String)> {
    vec![
        ("sort".to_string(), "created".to_string()),
        ("direction".to_string(), "desc".to_string()),
        ("state".to_string(), state.as_str().to_string()),
    ]
}

fn created_at(record: &Record) -> Result<DateTime<Utc>, String> {
    let raw = record
        .get("created_at")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing created_at".to_string())?;
    parse_api_timestamp(raw).map_err(|e| e.to_string())
}

fn author_login(commit: &Record) -> Option<&str> {
    commit
        .get("author")
        .and_then(Value::as_object)
        .and_then(|author| author.get("login"))
        .and_then(Value::as_str)
        .filter(|login| !login.is_empty())
}
