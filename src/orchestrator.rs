//! Download orchestration for a single item
//!
//! Builds the destination filename, runs the fetcher with retry, and only
//! reports success once the expected file is actually present at the final
//! destination. Two layouts are supported:
//!
//! - **direct**: the fetcher writes straight into `download_dir`
//! - **staged**: the fetcher writes into `temp_dir`; the verified file is then
//!   moved into `download_dir`
//!
//! Remote-share destinations (`\\server\share`) are never created locally.

use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::tools::{FetchRequest, MediaFetcher};
use crate::types::VideoItem;
use crate::utils::{is_remote_share, media_file_stem, move_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Extension of the file the fetcher is asked to produce
const OUTPUT_EXTENSION: &str = "mp4";

/// Materializes items as local files
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn MediaFetcher>,
    policy: RetryPolicy,
    download_dir: PathBuf,
    temp_dir: Option<PathBuf>,
    format: String,
}

impl DownloadOrchestrator {
    /// Create an orchestrator using directories, format and retry policy from `config`
    pub fn new(fetcher: Arc<dyn MediaFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            policy: config.retry_policy(),
            download_dir: config.download_dir.clone(),
            temp_dir: config.temp_dir.clone(),
            format: config.download_format.clone(),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Download one item
    ///
    /// Returns the final file path, or `None` if the item could not be
    /// materialized. Never returns an error: every failure is logged here.
    pub async fn download(&self, item: &VideoItem) -> Option<PathBuf> {
        match self.try_download(item).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(item_id = %item.video_id, error = %e, "Download failed");
                None
            }
        }
    }

    async fn try_download(&self, item: &VideoItem) -> Result<PathBuf> {
        let stem = media_file_stem(&item.channel_name, &item.upload_date, &item.title);
        let file_name = format!("{stem}.{OUTPUT_EXTENSION}");
        let work_dir = self.temp_dir.as_deref().unwrap_or(&self.download_dir);
        ensure_dir(work_dir).await?;

        let request = FetchRequest {
            url: item.watch_url(),
            output_template: work_dir.join(format!("{stem}.%(ext)s")),
            format: self.format.clone(),
        };
        let fetched_path = work_dir.join(&file_name);

        debug!(
            item_id = %item.video_id,
            fetcher = self.fetcher.name(),
            template = %request.output_template.display(),
            "Starting download"
        );

        retry_with_backoff(&self.policy, |_| self.fetcher.fetch(&request)).await?;

        if !file_exists(&fetched_path).await {
            warn!(
                item_id = %item.video_id,
                path = %fetched_path.display(),
                "Fetcher reported success but the output file is missing"
            );
            return Err(FetchError::OutputMissing { path: fetched_path }.into());
        }

        if self.temp_dir.is_none() {
            return Ok(fetched_path);
        }

        let destination = self.download_dir.join(&file_name);
        ensure_dir(&self.download_dir).await?;
        move_file(&fetched_path, &destination)
            .await
            .map_err(|e| FetchError::MoveFailed {
                source_path: fetched_path.clone(),
                dest_path: destination.clone(),
                reason: e.to_string(),
            })?;

        if !file_exists(&destination).await {
            return Err(FetchError::OutputMissing { path: destination }.into());
        }

        info!(
            item_id = %item.video_id,
            path = %destination.display(),
            "Moved download to destination"
        );
        Ok(destination)
    }
}

/// Create a local directory; remote shares are left to the tool writing into them
async fn ensure_dir(dir: &Path) -> Result<()> {
    if is_remote_share(dir) {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir).await.map_err(Error::Io)
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
