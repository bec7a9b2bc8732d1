mod formatter;
mod github;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use crate::github::prelude::*;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Show a GitHub user's recent public activity")]
struct Cli {
    #[arg(value_name = "USERNAME", help = "GitHub user to look up")]
    username: String,
    #[arg(
        long,
        value_name = "HOST",
        default_value = "github.com",
        help = "Target GitHub hostname"
    )]
    hostname: String,
    #[arg(long, help = "Prefix each line with the event date")]
    dates: bool,
    #[arg(short, long, help = "Log request details to stderr")]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let Cli {
        username,
        hostname,
        dates,
        verbose,
    } = Cli::parse();

    init_tracing(verbose);

    // Checked before any client is built so a blank name never reaches the network.
    let username = match Username::parse(&username) {
        Ok(username) => username,
        Err(err) => {
            println!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&username, &hostname, dates).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(username: &Username, hostname: &str, dates: bool) -> anyhow::Result<()> {
    write_stdout(&format!("Fetching activity for GitHub user: {username}\n\n"))?;

    let client = Client::new(hostname)?;
    let events = client.fetch_events(username).await?;
    let output = crate::formatter::format_report(&events, dates);

    write_stdout(&output)
}

fn write_stdout(text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write to stdout")
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
