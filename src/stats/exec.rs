use super::{output_json, output_ndjson, output_problems, output_table, Analyzer};
use crate::api::{CancelToken, HttpTransport};
use crate::cli::{CommonArgs, OutputArgs};
use crate::config::FileConfig;
use crate::model::RepoId;
use crate::util::resolve_window;
use anyhow::Context;
use chrono::Utc;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::{Duration, Instant};

const PROBLEMS_EXIT_CODE: u8 = 2;

pub fn exec(common: CommonArgs, output: OutputArgs) -> anyhow::Result<ExitCode> {
    let file_config = FileConfig::load(common.config.as_deref())
        .context("Failed to load configuration")?
        .with_env_overrides();
    let config = file_config
        .engine_config()
        .context("Invalid configuration")?;
    let credential = file_config.credential();

    let repo = RepoId::from_url(&common.url).context("Failed to parse repository URL")?;

    // One snapshot for the whole run so stale thresholds do not drift mid-scan.
    let now = Utc::now();
    let window = resolve_window(
        common.start_date.as_deref(),
        common.end_date.as_deref(),
        common.date_format.as_deref(),
        now,
    )
    .context("Failed to resolve date window")?;

    let cancel = match common.max_duration {
        Some(limit) => CancelToken::with_deadline(Instant::now() + limit),
        None => CancelToken::new(),
    };

    let transport = HttpTransport::new(&config).context("Failed to build HTTP client")?;
    let analyzer = Analyzer::new(transport, repo.clone(), config)
        .with_credential(credential)
        .with_cancel(cancel);

    let branch = Some(common.branch.as_str()).filter(|b| !b.is_empty());

    let show_progress = !output.json && !output.ndjson && Term::stderr().is_term();
    let pb = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    let report = analyzer.report_with_progress(&window, branch, now, |category| {
        pb.set_message(format!("Scanning {category} of {repo}..."));
    });
    pb.finish_and_clear();

    if output.json {
        output_json(&report, &repo, branch, &window)?;
    } else if output.ndjson {
        output_ndjson(&report)?;
    } else {
        output_table(&report, &repo, &window, analyzer.config().top_users)?;
        output_problems(&report);
    }

    if output.strict && !report.problems().is_empty() {
        return Ok(ExitCode::from(PROBLEMS_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}
