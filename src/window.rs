//! Creation-time window and the early-stop policy built on top of it.
//!
//! Pull request and issue listings are always requested sorted by creation
//! time, newest first. Under that ordering an item older than the window
//! start means every later item is older too, so the scan may stop. An item
//! newer than the window end only excludes itself.

use crate::error::{PulseError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Timestamp format used by the GitHub REST API in both directions.
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn parse_api_timestamp(input: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input, API_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| PulseError::InvalidDate(format!("'{input}': {e}")))
}

pub fn format_api_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(API_DATETIME_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    InWindow,
    /// `may_stop` is set only when the item is older than the window start.
    OutOfWindow { may_stop: bool },
}

/// Optional `[start, end]` creation-time range, unbounded where a side is absent.
///
/// `start <= end` is not checked here; an inverted window simply matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn classify(&self, created_at: &DateTime<Utc>) -> Classification {
        if let Some(end) = self.end {
            if created_at > &end {
                return Classification::OutOfWindow { may_stop: false };
            }
        }
        if let Some(start) = self.start {
            if created_at < &start {
                return Classification::OutOfWindow { may_stop: true };
            }
        }
        Classification::InWindow
    }

    pub fn contains(&self, created_at: &DateTime<Utc>) -> bool {
        self.classify(created_at) == Classification::InWindow
    }

    /// `since`/`until` query parameters for endpoints that filter server-side.
    pub fn server_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = &self.start {
            params.push(("since", format_api_timestamp(start)));
        }
        if let Some(end) = &self.end {
            params.push(("until", format_api_timestamp(end)));
        }
        params
    }
}

/// How a category uses the window while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolicy {
    /// The endpoint received `since`/`until` and already filtered; no client-side check.
    ServerFiltered,
    /// Records carry `created_at` and arrive newest first; stop at the first one older than start.
    ClientWindow(Window),
}
