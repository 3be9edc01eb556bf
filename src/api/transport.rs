use crate::config::{AuthCredential, EngineConfig};
use crate::model::Problem;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::warn;

/// Status and body of one API call, whatever the status was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// A call that produced no response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,
    #[error("connection unusable: {detail}")]
    ConnectionUnusable { detail: String },
}

impl TransportFailure {
    pub fn into_problem(self, page: u32) -> Problem {
        match self {
            TransportFailure::Timeout => Problem::Timeout { page },
            TransportFailure::ConnectionUnusable { detail } => {
                Problem::ConnectionUnusable { page, detail }
            }
        }
    }
}

/// One authenticated GET against the API host.
///
/// `path` already carries its query string (see [`request_path`]).
pub trait Transport {
    fn send(
        &self,
        path: &str,
        credential: Option<&AuthCredential>,
    ) -> Result<RawResponse, TransportFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        path: &str,
        credential: Option<&AuthCredential>,
    ) -> Result<RawResponse, TransportFailure> {
        (**self).send(path, credential)
    }
}

/// `collection_path?page=N&per_page=P&k=v...`, values taken verbatim.
pub fn request_path(
    collection_path: &str,
    page: u32,
    per_page: usize,
    query: &[(String, String)],
) -> String {
    let mut path = format!("{collection_path}?page={page}&per_page={per_page}");
    for (key, value) in query {
        path.push('&');
        path.push_str(key);
        path.push('=');
        path.push_str(value);
    }
    path
}

/// Blocking reqwest client keeping a single idle connection to the API host.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &EngineConfig) -> crate::error::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        path: &str,
        credential: Option<&AuthCredential>,
    ) -> Result<RawResponse, TransportFailure> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.header_value());
        }

        let response = request.send().map_err(|e| failure(path, e))?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(path, status = status.as_u16(), "unexpected response status");
        }

        let body = response.text().map_err(|e| failure(path, e))?;
        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn failure(path: &str, err: reqwest::Error) -> TransportFailure {
    warn!(path, error = %err, "request failed");
    if err.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::ConnectionUnusable {
            detail: err.to_string(),
        }
    }
}
