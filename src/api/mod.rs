pub mod paginate;
pub mod transport;

pub use paginate::{CancelToken, PageItem, Pages, Paginator};
pub use transport::{request_path, HttpTransport, RawResponse, Transport, TransportFailure};

/// The three collection endpoints under `/repos/{owner}/{repo}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Commits,
    Pulls,
    Issues,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Commits => "commits",
            Collection::Pulls => "pulls",
            Collection::Issues => "issues",
        }
    }
}
