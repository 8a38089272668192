//! channel-dl command line entry point

use anyhow::{Context, Result};
use channel_dl::config::read_channel_list;
use channel_dl::utils::discover_cookie_file;
use channel_dl::{
    ChannelEnumerator, Config, CycleCoordinator, Database, DownloadOrchestrator, EventStatus,
    PollScheduler, YtDlp, cancel_on_shutdown,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[derive(Parser)]
#[command(name = "channel-dl")]
#[command(about = "Poll video channels and download each new upload once")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "CHANNEL_DL_CONFIG", default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Path to the channel list (one handle per line)
    #[arg(long, env = "CHANNEL_DL_CHANNELS", default_value = "channels.txt", global = true)]
    channels: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll all channels now and then every interval until interrupted (default)
    Run,

    /// Poll all channels once and exit
    Once,

    /// Show ledger size and the most recent download attempts
    Status {
        /// Number of events to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = match "channel_dl=info".parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(&cli.config).context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let cancel = CancellationToken::new();
            cancel_on_shutdown(cancel.clone());

            let coordinator = build_coordinator(&mut config, cancel.clone()).await?;
            let scheduler = PollScheduler::new(config.interval, cancel);
            let coordinator = &coordinator;
            let channels_path = cli.channels.as_path();

            scheduler
                .run(|| async move {
                    let channels = read_channel_list(channels_path)?;
                    Ok(coordinator.run_cycle(&channels).await)
                })
                .await;
        }
        Commands::Once => {
            let cancel = CancellationToken::new();
            cancel_on_shutdown(cancel.clone());

            let coordinator = build_coordinator(&mut config, cancel).await?;
            let channels = read_channel_list(&cli.channels)?;
            coordinator.run_cycle(&channels).await;
        }
        Commands::Status { limit } => {
            print_status(&config, limit).await?;
        }
    }

    Ok(())
}

async fn build_coordinator(
    config: &mut Config,
    cancel: CancellationToken,
) -> Result<CycleCoordinator> {
    if config.cookies_file.is_none() {
        config.cookies_file = discover_cookie_file(Path::new("."));
    }
    match &config.cookies_file {
        Some(path) => info!(path = %path.display(), "Using cookie file"),
        None => warn!("No cookie file found, members-only and age-gated uploads may fail"),
    }

    let ytdlp = Arc::new(YtDlp::from_config(config)?);
    let db = Arc::new(Database::new(&config.database_path).await?);

    info!(
        interval_min = config.interval.as_secs() / 60,
        query_limit = config.query_limit,
        first_run_limit = config.first_run_limit,
        download_dir = %config.download_dir.display(),
        "channel-dl starting"
    );

    Ok(CycleCoordinator::new(
        db,
        ChannelEnumerator::new(ytdlp.clone(), config),
        DownloadOrchestrator::new(ytdlp, config),
        cancel,
    ))
}

async fn print_status(config: &Config, limit: usize) -> Result<()> {
    let db = Database::new(&config.database_path).await?;

    let known = db.ledger_count(None).await?;
    let succeeded = db.count_events(Some(EventStatus::Success)).await?;
    let failed = db.count_events(Some(EventStatus::Failed)).await?;
    println!("Downloaded items: {known}");
    println!("Attempts: {succeeded} succeeded, {failed} failed");

    let events = db.recent_events(limit).await?;
    if events.is_empty() {
        println!("No download attempts recorded yet");
    }
    for event in events {
        let path = event
            .output_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{}  {:<7}  {:<24}  {:<12}  {}{}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.status.as_str(),
            event.channel_id,
            event.item_id,
            path,
            if event.is_first_run_batch { "  (first run)" } else { "" },
        );
    }

    db.close().await;
    Ok(())
}
