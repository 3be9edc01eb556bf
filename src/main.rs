use anyhow::Result;
use ghpulse::cli::Cli;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.execute()
}
