pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod stats;
pub mod util;
pub mod window;

pub use api::{
    CancelToken, Collection, HttpTransport, PageItem, Paginator, RawResponse, Transport,
    TransportFailure,
};
pub use config::{AuthCredential, EngineConfig, FileConfig};
pub use error::{PulseError, Result};
pub use model::{
    ActivityTally, CategoryCounter, CategoryReport, ItemState, Label, Problem, RepoId, RepoReport,
    UserActivity,
};
pub use stats::{Analyzer, ScanRequest};
pub use window::{Classification, ScanPolicy, Window};
