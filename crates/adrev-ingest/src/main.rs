//! Adrev Ingest - run a feed in the foreground

use adrev_common::logging::{init_logging, LogConfig, LogLevel};
use adrev_server::{
    config::Config,
    ingest::{FeedKind, FeedRunner, IngestConfig, Pending},
    secrets::EnvSecretStore,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adrev-ingest")]
#[command(author, version, about = "Adrev feed ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one feed to completion
    Run {
        /// placeexchange, vstar or springserve
        #[arg(value_parser = parse_feed)]
        feed: FeedKind,
    },

    /// Show what a run would pick up, without ingesting anything
    Pending {
        /// placeexchange, vstar or springserve
        #[arg(value_parser = parse_feed)]
        feed: FeedKind,
    },
}

fn parse_feed(value: &str) -> std::result::Result<FeedKind, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("adrev-ingest")
        .filter_directives("tiberius=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = Config::load()?;
    let runner = FeedRunner::connect(
        IngestConfig::from_env()?,
        &config.database.secret_name,
        &EnvSecretStore,
    )
    .await?;

    match cli.command {
        Command::Run { feed } => {
            info!(feed = %feed, "Running feed");
            let stats = runner.run(feed).await?;
            info!(
                feed = %feed,
                objects_processed = stats.objects_processed,
                objects_skipped = stats.objects_skipped,
                objects_failed = stats.objects_failed,
                rows_upserted = stats.rows_upserted,
                rows_rejected = stats.rows_rejected,
                rows_failed = stats.rows_failed,
                duration_secs = stats.duration_secs,
                "Feed run complete"
            );
        },
        Command::Pending { feed } => match runner.pending(feed).await? {
            Pending::Objects(objects) => {
                info!(feed = %feed, count = objects.len(), "Pending objects");
                for object in &objects {
                    info!(key = %object.key, size = ?object.size, "Pending");
                }
            },
            Pending::ReportDays(Some((start, end))) => {
                info!(feed = %feed, %start, %end, "Pending report window");
            },
            Pending::ReportDays(None) => {
                info!(feed = %feed, "Reporting is up to date");
            },
        },
    }

    Ok(())
}
