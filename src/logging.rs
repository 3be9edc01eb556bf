use anyhow::Context;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "ghpulse=warn";
const DEFAULT_FILE_FILTER: &str = "ghpulse=info";

/// Install the global subscriber: stderr by default, or `log_file` without ANSI colours.
/// `RUST_LOG` overrides the default filter either way.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let default = if log_file.is_some() {
        DEFAULT_FILE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}
