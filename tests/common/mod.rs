#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use ghpulse::window::{format_api_timestamp, parse_api_timestamp};
use ghpulse::{AuthCredential, EngineConfig, RawResponse, RepoId, Transport, TransportFailure};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

/// In-memory API: answers requests from a queue and remembers what was asked.
/// Once the queue is drained every request gets an empty list.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<RawResponse, TransportFailure>>>,
    requests: RefCell<Vec<String>>,
    credentials: RefCell<Vec<Option<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, items: Vec<Value>) -> Self {
        self.respond(200, Value::Array(items).to_string())
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.responses.borrow_mut().push_back(Ok(RawResponse {
            status,
            body: body.into(),
        }));
        self
    }

    pub fn fail(self, failure: TransportFailure) -> Self {
        self.responses.borrow_mut().push_back(Err(failure));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn credentials(&self) -> Vec<Option<String>> {
        self.credentials.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        path: &str,
        credential: Option<&AuthCredential>,
    ) -> Result<RawResponse, TransportFailure> {
        self.requests.borrow_mut().push(path.to_string());
        self.credentials
            .borrow_mut()
            .push(credential.map(|c| c.encoded().to_string()));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::ok("[]")))
    }
}

pub fn repo() -> RepoId {
    RepoId::new("octo", "widgets").unwrap()
}

pub fn config_with_page_size(per_page: usize) -> EngineConfig {
    EngineConfig {
        per_page,
        ..EngineConfig::default()
    }
}

pub fn ts(s: &str) -> DateTime<Utc> {
    parse_api_timestamp(s).unwrap()
}

/// A pull request or issue created at `created_at`.
pub fn item(number: u64, created_at: DateTime<Utc>) -> Value {
    json!({
        "number": number,
        "state": "open",
        "created_at": format_api_timestamp(&created_at),
    })
}

/// `count` items, newest first, one hour apart, the first created at `newest`.
pub fn items_descending(count: usize, newest: DateTime<Utc>) -> Vec<Value> {
    (0..count)
        .map(|i| item(i as u64 + 1, newest - Duration::hours(i as i64)))
        .collect()
}

pub fn commit(login: Option<&str>) -> Value {
    match login {
        Some(login) => json!({ "sha": format!("sha-{login}"), "author": { "login": login } }),
        None => json!({ "sha": "sha-anonymous", "author": null }),
    }
}
