//! Lazy page-by-page traversal of a collection endpoint.
//!
//! The next page is requested only once the consumer has pulled every record
//! of the current one, so dropping the iterator early saves the remaining
//! requests. Anything that ends a traversal abnormally (transport failure,
//! error payload, cancellation) is yielded once as a [`Problem`] and then the
//! iterator is exhausted.

use super::transport::{request_path, Transport};
use crate::config::AuthCredential;
use crate::model::Problem;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const MAX_BODY_EXCERPT: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    Record(Value),
    Problem(Problem),
}

/// Cooperative cancellation, checked before every page request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips once `deadline` has passed.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Shared settings for every traversal of one run.
pub struct Paginator<'a, T> {
    transport: &'a T,
    per_page: usize,
    credential: Option<&'a AuthCredential>,
    cancel: Option<&'a CancelToken>,
}

impl<'a, T: Transport> Paginator<'a, T> {
    pub fn new(transport: &'a T, per_page: usize) -> Self {
        Self {
            transport,
            per_page,
            credential: None,
            cancel: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<&'a AuthCredential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Start a fresh traversal from page 1.
    pub fn paginate(
        &self,
        collection_path: impl Into<String>,
        query: Vec<(String, String)>,
    ) -> Pages<'a, T> {
        Pages {
            transport: self.transport,
            credential: self.credential,
            cancel: self.cancel,
            collection_path: collection_path.into(),
            query,
            per_page: self.per_page,
            next_page: 1,
            buffer: VecDeque::new(),
            finished: false,
        }
    }
}

pub struct Pages<'a, T> {
    transport: &'a T,
    credential: Option<&'a AuthCredential>,
    cancel: Option<&'a CancelToken>,
    collection_path: String,
    query: Vec<(String, String)>,
    per_page: usize,
    next_page: u32,
    buffer: VecDeque<Value>,
    finished: bool,
}

impl<T: Transport> Pages<'_, T> {
    fn fetch_page(&mut self) -> Option<Problem> {
        let page = self.next_page;

        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            self.finished = true;
            return Some(Problem::Cancelled { page });
        }

        let path = request_path(&self.collection_path, page, self.per_page, &self.query);
        debug!(path = %path, "fetching page");

        let response = match self.transport.send(&path, self.credential) {
            Ok(response) => response,
            Err(failure) => {
                self.finished = true;
                return Some(failure.into_problem(page));
            }
        };

        match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Array(items)) => {
                if items.is_empty() || items.len() < self.per_page {
                    self.finished = true;
                } else {
                    self.next_page += 1;
                }
                self.buffer.extend(items);
                None
            }
            Ok(payload) => {
                warn!(
                    path = %path,
                    status = response.status,
                    "API returned an error payload instead of a list"
                );
                self.finished = true;
                Some(Problem::ApiError {
                    page,
                    status: response.status,
                    payload,
                })
            }
            Err(e) => {
                warn!(
                    path = %path,
                    status = response.status,
                    error = %e,
                    "response body is not JSON"
                );
                self.finished = true;
                Some(Problem::InvalidBody {
                    page,
                    status: response.status,
                    body: response.body.chars().take(MAX_BODY_EXCERPT).collect(),
                })
            }
        }
    }
}

impl<T: Transport> Iterator for Pages<'_, T> {
    type Item = PageItem;

    fn next(&mut self) -> Option<PageItem> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(PageItem::Record(record));
            }
            if self.finished {
                return None;
            }
            if let Some(problem) = self.fetch_page() {
                return Some(PageItem::Problem(problem));
            }
        }
    }
}
