pub mod aggregate;
pub mod exec;
pub mod output;

pub use aggregate::{Analyzer, Record, ScanRequest};
pub use exec::exec;
pub use output::{output_json, output_ndjson, output_problems, output_table};
