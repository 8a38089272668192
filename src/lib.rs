//! # channel-dl
//!
//! Polls a set of video channels, discovers new uploads and downloads each
//! one at most once, keeping a durable ledger of what has been retrieved.
//!
//! ## Design
//!
//! - **At-most-once success** - an item enters the ledger only after its file
//!   is verified on disk; failed items are retried on the next cycle
//! - **Newest first** - each channel's batch is processed in listing order
//! - **First-run cap** - a channel polled for the first time only gets its
//!   most recent uploads downloaded
//! - **Sequential** - one cycle, one channel, one item at a time
//!
//! ## Quick Start
//!
//! ```no_run
//! use channel_dl::{
//!     ChannelEnumerator, ChannelId, Config, CycleCoordinator, Database, DownloadOrchestrator,
//!     YtDlp,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let ytdlp = Arc::new(YtDlp::from_config(&config)?);
//!     let db = Arc::new(Database::new(&config.database_path).await?);
//!
//!     let coordinator = CycleCoordinator::new(
//!         db,
//!         ChannelEnumerator::new(ytdlp.clone(), &config),
//!         DownloadOrchestrator::new(ytdlp, &config),
//!         CancellationToken::new(),
//!     );
//!
//!     let report = coordinator.run_cycle(&[ChannelId::new("MoneyXYZ")]).await;
//!     println!("downloaded {} new uploads", report.downloaded);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration and channel list loading
pub mod config;
/// Per-cycle coordination of listing, dedup and download
pub mod coordinator;
/// Database persistence layer
pub mod db;
/// Channel listing with retry and partial-failure tolerance
pub mod enumerator;
/// Error types
pub mod error;
/// Single-item download with verification and relocation
pub mod orchestrator;
/// Retry logic with exponential backoff
pub mod retry;
/// Fixed-interval poll scheduling
pub mod scheduler;
/// External tool traits and the yt-dlp implementation
pub mod tools;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::CycleCoordinator;
pub use db::{Database, DownloadEvent};
pub use enumerator::ChannelEnumerator;
pub use error::{DatabaseError, Error, FetchError, ListError, Result};
pub use orchestrator::DownloadOrchestrator;
pub use retry::RetryPolicy;
pub use scheduler::PollScheduler;
pub use tools::{ChannelLister, FetchRequest, ListerOutput, MediaFetcher, YtDlp};
pub use types::{ChannelId, CycleReport, EventStatus, VideoItem};

use tokio_util::sync::CancellationToken;

/// Cancel `token` once a termination signal arrives.
///
/// Spawns a background task around [`shutdown_signal`]. Components holding a
/// clone of the token stop at their next safe point.
pub fn cancel_on_shutdown(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown requested, finishing current item");
        token.cancel();
    })
}

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

/// Wait for a termination signal.
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
