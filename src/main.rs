//! # Rank Tracker CLI (`rank-tracker`)
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rank-tracker locate --keyword <k> --target <id-or-url>` | Find a product's rank once and print it as JSON |
//! | `rank-tracker status` | Show the configured schedule and its next run as JSON |
//! | `rank-tracker daemon --track "<keyword>\|<url>"` | Track products and run the daily trigger until Ctrl-C |
//!
//! ```bash
//! rank-tracker locate --keyword lenor \
//!     --target https://www.bol.com/nl/nl/p/lenor-geurbooster/9300000170626119/
//!
//! RANK_TRACKER_ENABLE_SCHEDULER=1 rank-tracker daemon \
//!     --track "lenor|https://www.bol.com/nl/nl/p/lenor-geurbooster/9300000170626119/"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use rank_tracker::TrackerService;
use rank_tracker::infrastructure::config::{AppConfig, ConfigManager, ENABLE_SCHEDULER_ENV};
use rank_tracker::infrastructure::logging::{init_logging_with_config, log_system_info};
use rank_tracker::infrastructure::memory_store::InMemoryStore;

/// Track where a product ranks in e-commerce search results.
#[derive(Parser)]
#[command(name = "rank-tracker", version, about)]
struct Cli {
    /// Configuration file (JSON). Defaults to the per-user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate a product once and print the result as JSON.
    Locate {
        /// Search keyword
        #[arg(long)]
        keyword: String,

        /// Product identifier or product page URL
        #[arg(long)]
        target: String,

        /// Pages to scan per strategy (defaults to the configured limit)
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Print the configured schedule and when it would next run.
    Status,

    /// Track products and run the daily trigger until interrupted.
    Daemon {
        /// Entry to track, as "<keyword>|<product url>". Repeatable.
        #[arg(long = "track", value_name = "KEYWORD|URL")]
        track: Vec<String>,

        /// Expire tracked entries after this many days
        #[arg(long)]
        stop_after_days: Option<u32>,

        /// Start the trigger even when the configuration leaves it off
        #[arg(long)]
        start: bool,

        /// Run one batch immediately before waiting for the schedule
        #[arg(long)]
        run_now: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_effective_config().await?;

    let timezone = config.scheduler.tz()?;
    init_logging_with_config(&config.logging, timezone)?;
    log_system_info();

    let service = TrackerService::from_config(&config, Arc::new(InMemoryStore::new()))?;

    match cli.command {
        Commands::Locate {
            keyword,
            target,
            max_pages,
        } => {
            let result = service.locate(&keyword, &target, max_pages).await?;
            if !result.is_found() {
                info!("🔍 '{}' not found in {} scanned results", target, result.total_scanned);
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Status => {
            let status = serde_json::json!({
                "running": service.trigger_status().running,
                "startOnLaunch": config.scheduler.start_on_launch,
                "schedule": service.schedule_plan(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Daemon {
            track,
            stop_after_days,
            start,
            run_now,
        } => run_daemon(&service, &config, &track, stop_after_days, start, run_now).await?,
    }

    Ok(())
}

fn parse_track_spec(spec: &str) -> Result<(&str, &str)> {
    spec.split_once('|')
        .map(|(keyword, url)| (keyword.trim(), url.trim()))
        .filter(|(keyword, url)| !keyword.is_empty() && !url.is_empty())
        .ok_or_else(|| anyhow!("expected \"<keyword>|<product url>\", got {spec:?}"))
}

async fn run_daemon(
    service: &TrackerService,
    config: &AppConfig,
    track: &[String],
    stop_after_days: Option<u32>,
    start: bool,
    run_now: bool,
) -> Result<()> {
    for spec in track {
        let (keyword, url) = parse_track_spec(spec)?;
        let entry = service
            .add_tracked_product(keyword, url, stop_after_days)
            .await
            .with_context(|| format!("Failed to track {spec:?}"))?;
        service.toggle_schedule(entry.id)?;
    }

    if run_now {
        service.run_batch_now().await?;
    }

    if start || config.scheduler.start_on_launch {
        service.start_trigger();
    } else {
        warn!(
            "Scheduler disabled; pass --start or set {}=1 to enable it",
            ENABLE_SCHEDULER_ENV
        );
    }
    info!("{}", serde_json::to_string(&service.trigger_status())?);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("🛑 Shutdown requested");
    service.stop_trigger().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_spec_splits_on_first_pipe() {
        assert_eq!(
            parse_track_spec(" lenor | https://www.bol.com/nl/nl/p/x/9300000170626119/ ").unwrap(),
            ("lenor", "https://www.bol.com/nl/nl/p/x/9300000170626119/")
        );
        assert!(parse_track_spec("no separator").is_err());
        assert!(parse_track_spec("|https://x").is_err());
    }

    #[test]
    fn cli_parses_daemon_flags() {
        let cli = Cli::try_parse_from([
            "rank-tracker",
            "daemon",
            "--track",
            "a|https://x/p/a/1234567890/",
            "--track",
            "b|https://x/p/b/1234567891/",
            "--start",
        ])
        .unwrap();
        match cli.command {
            Commands::Daemon { track, start, run_now, .. } => {
                assert_eq!(track.len(), 2);
                assert!(start);
                assert!(!run_now);
            }
            _ => panic!("expected daemon"),
        }
    }
}
