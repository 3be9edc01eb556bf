use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ghpulse")]
#[command(
    about = "GitHub repository activity: active users, pull requests, issues and stale items"
)]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Repository URL, e.g. https://github.com/owner/repo")]
    pub url: String,

    #[arg(
        short,
        long = "start-date",
        alias = "start_date",
        help = "Only count items created at or after this date"
    )]
    pub start_date: Option<String>,

    #[arg(
        short,
        long = "end-date",
        alias = "end_date",
        help = "Only count items created at or before this date"
    )]
    pub end_date: Option<String>,

    #[arg(
        short = 'f',
        long = "format",
        help = "chrono format of --start-date/--end-date \
                (default: API format, RFC3339, YYYY-MM-DD or 'N days ago')"
    )]
    pub date_format: Option<String>,

    #[arg(
        short,
        long,
        default_value = "master",
        help = "Branch for commits and pull request base"
    )]
    pub branch: String,

    #[arg(long, help = "Path to config file (default: <config dir>/ghpulse/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Write logs to this file instead of stderr")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        value_parser = humantime::parse_duration,
        help = "Give up on remaining pages after this long, e.g. '2m'"
    )]
    pub max_duration: Option<Duration>,
}

#[derive(Args, Clone)]
pub struct OutputArgs {
    #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON, one line per category")]
    pub ndjson: bool,

    #[arg(long, help = "Exit with status 2 when any problem was recorded")]
    pub strict: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<ExitCode> {
        crate::logging::init(self.common.log_file.as_deref())?;
        crate::stats::exec(self.common, self.output)
    }
}
