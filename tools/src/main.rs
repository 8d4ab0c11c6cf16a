//! social-graph: line-oriented shell over an in-memory social graph.
//!
//! Usage:
//!   social-graph [--config FILE] [--data FILE] [--format human|json] [-v]
//!
//! Reads one command per line from stdin; `help` lists them.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use social_graph_tools::{Outcome, OutputFormat, Session, Settings, Shell};

#[derive(Parser, Debug)]
#[command(name = "social-graph", version, about = "In-memory social graph shell")]
struct Cli {
    /// TOML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Graph file to load at startup (overrides `data_file` in settings)
    #[arg(short, long, value_name = "FILE", env = "SOCIAL_GRAPH_DATA")]
    data: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Human,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(data) = cli.data {
        settings.data_file = Some(data);
    }
    debug!(?settings, "settings resolved");

    let data_file = settings.data_file.clone();
    let mut session = Session::new(settings);
    if let Some(path) = data_file.filter(|p| p.exists()) {
        session
            .load(&path)
            .with_context(|| format!("loading {}", path.display()))?;
        info!(
            path = %path.display(),
            users = session.store().user_count(),
            "graph loaded"
        );
    }

    let mut shell = Shell::new(session, cli.format.into());
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match shell.execute_line(&line) {
            Outcome::Output(text) if text.is_empty() => {}
            Outcome::Output(text) => writeln!(stdout, "{text}")?,
            Outcome::Quit => break,
        }
        stdout.flush()?;
    }

    Ok(())
}
