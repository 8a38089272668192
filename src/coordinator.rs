//! Per-cycle coordination
//!
//! For every channel: decide whether this is its first run (no ledger
//! entries), enumerate its recent uploads, skip the ones already in the
//! ledger, download the rest newest-first and record each outcome.
//!
//! A failed download is logged but never enters the ledger, so the item is
//! attempted again on the next cycle. A failure while handling one item or one
//! channel is logged and the cycle moves on to the next.

use crate::db::{Database, NewEvent};
use crate::enumerator::ChannelEnumerator;
use crate::error::Result;
use crate::orchestrator::DownloadOrchestrator;
use crate::types::{ChannelId, CycleReport, EventStatus, VideoItem};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of handling a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Skipped,
    Downloaded,
    Failed,
}

/// Runs one poll cycle over a set of channels
pub struct CycleCoordinator {
    db: Arc<Database>,
    enumerator: ChannelEnumerator,
    orchestrator: DownloadOrchestrator,
    cancel: CancellationToken,
}

impl CycleCoordinator {
    /// Create a coordinator
    ///
    /// `cancel` is checked between channels and between items; an in-flight
    /// listing or download always runs to completion.
    pub fn new(
        db: Arc<Database>,
        enumerator: ChannelEnumerator,
        orchestrator: DownloadOrchestrator,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            enumerator,
            orchestrator,
            cancel,
        }
    }

    /// Process every channel once, in order
    pub async fn run_cycle(&self, channels: &[ChannelId]) -> CycleReport {
        let mut report = CycleReport::default();

        if channels.is_empty() {
            warn!("No channels configured, nothing to check");
            return report;
        }

        info!(channels = channels.len(), "Checking channels for new uploads");

        for channel in channels {
            if self.cancel.is_cancelled() {
                info!("Shutdown requested, stopping cycle early");
                break;
            }

            match self.process_channel(channel).await {
                Ok(channel_report) => {
                    report.downloaded += channel_report.downloaded;
                    report.failed += channel_report.failed;
                    report.skipped += channel_report.skipped;
                }
                Err(e) => {
                    error!(channel = %channel, error = %e, "Failed to process channel");
                }
            }
            report.channels += 1;
        }

        info!(
            channels = report.channels,
            downloaded = report.downloaded,
            failed = report.failed,
            skipped = report.skipped,
            "Check cycle complete"
        );
        report
    }

    /// Process one channel: enumerate, dedup, download, record
    pub async fn process_channel(&self, channel: &ChannelId) -> Result<CycleReport> {
        let mut report = CycleReport {
            channels: 1,
            ..Default::default()
        };

        let first_run = !self.db.has_history(channel.as_str()).await?;
        debug!(channel = %channel, first_run, "Processing channel");

        let items = self.enumerator.enumerate(channel, first_run).await;
        if items.is_empty() {
            warn!(channel = %channel, "No uploads found for channel");
            return Ok(report);
        }

        info!(channel = %channel, items = items.len(), first_run, "Listed channel uploads");

        for item in &items {
            if self.cancel.is_cancelled() {
                info!(channel = %channel, "Shutdown requested, stopping channel early");
                break;
            }

            match self.process_item(channel, item, first_run).await {
                Ok(ItemOutcome::Skipped) => report.skipped += 1,
                Ok(ItemOutcome::Downloaded) => report.downloaded += 1,
                Ok(ItemOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        channel = %channel,
                        item_id = %item.video_id,
                        error = %e,
                        "Failed to process item"
                    );
                }
            }
        }

        Ok(report)
    }

    async fn process_item(
        &self,
        channel: &ChannelId,
        item: &VideoItem,
        first_run: bool,
    ) -> Result<ItemOutcome> {
        if self.db.is_known(&item.video_id).await? {
            debug!(item_id = %item.video_id, "Already downloaded, skipping");
            return Ok(ItemOutcome::Skipped);
        }

        info!(
            channel = %channel,
            item_id = %item.video_id,
            title = %truncate_title(&item.title),
            "Found new upload"
        );

        match self.orchestrator.download(item).await {
            Some(path) => {
                self.db
                    .record_known(&item.video_id, channel.as_str())
                    .await?;
                self.db
                    .append_event(&NewEvent {
                        item_id: &item.video_id,
                        channel_id: channel.as_str(),
                        status: EventStatus::Success,
                        output_path: Some(&path),
                        is_first_run_batch: first_run,
                    })
                    .await?;
                info!(item_id = %item.video_id, path = %path.display(), "Download succeeded");
                Ok(ItemOutcome::Downloaded)
            }
            None => {
                self.db
                    .append_event(&NewEvent {
                        item_id: &item.video_id,
                        channel_id: channel.as_str(),
                        status: EventStatus::Failed,
                        output_path: None,
                        is_first_run_batch: first_run,
                    })
                    .await?;
                error!(item_id = %item.video_id, "Download failed, will retry next cycle");
                Ok(ItemOutcome::Failed)
            }
        }
    }
}

/// First 50 characters of a title, for log lines
fn truncate_title(title: &str) -> String {
    const MAX_CHARS: usize = 50;
    if title.chars().count() <= MAX_CHARS {
        title.to_string()
    } else {
        let mut short: String = title.chars().take(MAX_CHARS).collect();
        short.push_str("...");
        short
    }
}
