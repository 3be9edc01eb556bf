use crate::model::{
    CategoryCounter, CategoryReport, Label, RepoId, RepoReport, ReportOutput, SCHEMA_VERSION,
};
use crate::window::{format_api_timestamp, Window};
use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct CategoryLine<'a, C> {
    category: &'static str,
    #[serde(flatten)]
    report: &'a CategoryReport<C>,
}

pub fn output_json(
    report: &RepoReport,
    repo: &RepoId,
    branch: Option<&str>,
    window: &Window,
) -> Result<()> {
    let output = report_output(report, repo, branch, window, Utc::now());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn report_output(
    report: &RepoReport,
    repo: &RepoId,
    branch: Option<&str>,
    window: &Window,
    generated_at: DateTime<Utc>,
) -> ReportOutput {
    ReportOutput {
        version: SCHEMA_VERSION,
        generated_at,
        repository: repo.to_string(),
        branch: branch.map(str::to_string),
        window: *window,
        report: report.clone(),
    }
}

pub fn output_ndjson(report: &RepoReport) -> Result<()> {
    for line in ndjson_lines(report)? {
        println!("{line}");
    }
    Ok(())
}

fn ndjson_lines(report: &RepoReport) -> serde_json::Result<Vec<String>> {
    let mut lines = vec![serde_json::to_string(&CategoryLine {
        category: "active_users",
        report: &report.active_users,
    })?];
    for (category, counts) in counter_sections(report) {
        lines.push(serde_json::to_string(&CategoryLine {
            category,
            report: counts,
        })?);
    }
    Ok(lines)
}

fn counter_sections(
    report: &RepoReport,
) -> [(&'static str, &CategoryReport<CategoryCounter>); 6] {
    [
        ("open_pulls", &report.open_pulls),
        ("closed_pulls", &report.closed_pulls),
        ("stale_pulls", &report.stale_pulls),
        ("open_issues", &report.open_issues),
        ("closed_issues", &report.closed_issues),
        ("stale_issues", &report.stale_issues),
    ]
}

pub fn output_table(
    report: &RepoReport,
    repo: &RepoId,
    window: &Window,
    top_users: usize,
) -> Result<()> {
    print!("{}", render_table(report, repo, window, top_users)?);
    Ok(())
}

fn render_table(
    report: &RepoReport,
    repo: &RepoId,
    window: &Window,
    top_users: usize,
) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "{}", style(format!("Repository activity: {repo}")).bold())?;
    match (&window.start, &window.end) {
        (Some(start), Some(end)) => writeln!(
            out,
            "Items created from {} to {}",
            format_api_timestamp(start),
            format_api_timestamp(end)
        )?,
        (Some(start), None) => {
            writeln!(out, "Items created since {}", format_api_timestamp(start))?
        }
        (None, Some(end)) => writeln!(out, "Items created until {}", format_api_timestamp(end))?,
        (None, None) => {}
    }
    writeln!(out, "{}", "─".repeat(50))?;

    writeln!(out, "{}", style(format!("Active users (top {top_users})")).bold())?;
    if report.active_users.counts.is_empty() {
        writeln!(out, "  No commits with a known author")?;
    } else {
        writeln!(
            out,
            "  {:>4}  {:<32} {:>8}",
            style("#").dim(),
            style("Login").dim(),
            style("Commits").dim()
        )?;
        for (rank, user) in report.active_users.counts.iter().enumerate() {
            writeln!(
                out,
                "  {:>4}  {:<32} {:>8}",
                rank + 1,
                user.login,
                style(user.commits).cyan()
            )?;
        }
    }

    writeln!(out, "\n{}", style("Pull requests").bold())?;
    write_count(&mut out, "Open", &report.open_pulls, Label::Open)?;
    write_count(&mut out, "Closed", &report.closed_pulls, Label::Closed)?;
    write_count(&mut out, "Old", &report.stale_pulls, Label::Old)?;

    writeln!(out, "\n{}", style("Issues").bold())?;
    write_count(&mut out, "Open", &report.open_issues, Label::Open)?;
    write_count(&mut out, "Closed", &report.closed_issues, Label::Closed)?;
    write_count(&mut out, "Old", &report.stale_issues, Label::Old)?;

    Ok(out)
}

fn write_count(
    out: &mut String,
    name: &str,
    report: &CategoryReport<CategoryCounter>,
    label: Label,
) -> std::fmt::Result {
    let marker = if report.problems.is_empty() {
        String::new()
    } else {
        format!(" {}", style("(incomplete)").yellow())
    };
    writeln!(
        out,
        "  {:<8} {:>8}{}",
        name,
        style(report.counts.get(label)).cyan(),
        marker
    )
}

/// Problems go to stderr so table output stays clean when piped.
pub fn output_problems(report: &RepoReport) {
    let problems = report.problems();
    if problems.is_empty() {
        return;
    }

    eprintln!(
        "\n{}",
        style(format!("Problems ({})", problems.len())).yellow().bold()
    );
    for (category, problem) in problems {
        eprintln!("  {} {}", style(format!("[{category}]")).dim(), problem);
    }
}
