mod commands;
mod config;
mod logging;
mod notifier;
mod source;
mod watcher;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::Config;

#[derive(Parser)]
#[command(name = "agenda-watch")]
#[command(about = "Watch an iCalendar feed and post what changed to Discord")]
struct Cli {
    /// Config file (defaults to ~/.config/agenda-watch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed periodically and notify on every change
    Watch {
        /// Print notifications instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Override the configured interval (e.g., "30s", "5m")
        #[arg(short, long, value_parser = parse_duration)]
        interval: Option<Duration>,
    },
    /// Fetch the feed once and list upcoming events
    Check,
    /// Show the notification produced by the changes between two .ics files
    Preview {
        /// Earlier version of the calendar
        before: PathBuf,
        /// Later version of the calendar
        after: PathBuf,
    },
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Config::load(cli.config.as_deref())?.validate()?;
    logging::init(settings.log_format, cli.verbose);

    match cli.command {
        Commands::Watch { dry_run, interval } => {
            commands::watch::run(settings, dry_run, interval).await
        }
        Commands::Check => commands::check::run(settings).await,
        Commands::Preview { before, after } => {
            commands::preview::run(settings, before, after).await
        }
    }
}
