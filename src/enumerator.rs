//! Channel enumeration
//!
//! Asks the external lister for a channel's most recent uploads and turns its
//! line-delimited JSON into [`VideoItem`]s, newest first.
//!
//! Each listing attempt is classified before the retry policy sees it:
//!
//! | Lister result | Outcome |
//! |---|---|
//! | exit 0 (empty output included) | batch returned, no retry |
//! | non-zero, but some records parsed | partial batch returned, no retry |
//! | non-zero, members-only marker in stderr | stop retrying, keep what was parsed |
//! | non-zero otherwise | back off `2^attempt` units and retry |
//!
//! After the last attempt whatever was parsed (possibly nothing) is returned.
//! Malformed lines are skipped one by one.

use crate::config::Config;
use crate::error::ListError;
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::tools::{ChannelLister, MEMBERS_ONLY_MARKER};
use crate::types::{ChannelId, VideoItem};
use crate::utils::sanitize_listing_field;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Record type tag that marks a video entry
const VIDEO_RECORD: &str = "video";

/// Fields read from one lister record; everything else is ignored
#[derive(Debug, Deserialize)]
struct ListingRecord {
    #[serde(rename = "_type")]
    record_type: Option<String>,
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    upload_date: String,
    #[serde(default)]
    uploader: String,
}

/// Parse lister output, one JSON record per line
///
/// Only records tagged `_type = "video"` with a non-empty id become items.
/// Lines that are not valid JSON are skipped without affecting the rest.
pub fn parse_listing(output: &str) -> Vec<VideoItem> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ListingRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Skipping malformed listing line");
                None
            }
        })
        .filter(|record| record.record_type.as_deref() == Some(VIDEO_RECORD))
        .filter(|record| !record.id.is_empty())
        .map(|record| VideoItem {
            video_id: record.id,
            title: sanitize_listing_field(&record.title),
            upload_date: record.upload_date,
            channel_name: sanitize_listing_field(&record.uploader),
        })
        .collect()
}

/// Lists channels with retry and partial-failure tolerance
pub struct ChannelEnumerator {
    lister: Arc<dyn ChannelLister>,
    policy: RetryPolicy,
    query_limit: usize,
    first_run_limit: usize,
}

impl ChannelEnumerator {
    /// Create an enumerator using the caps and retry policy from `config`
    pub fn new(lister: Arc<dyn ChannelLister>, config: &Config) -> Self {
        Self::with_limits(
            lister,
            config.retry_policy(),
            config.query_limit,
            config.first_run_limit,
        )
    }

    /// Create an enumerator with explicit caps
    pub fn with_limits(
        lister: Arc<dyn ChannelLister>,
        policy: RetryPolicy,
        query_limit: usize,
        first_run_limit: usize,
    ) -> Self {
        Self {
            lister,
            policy,
            query_limit,
            first_run_limit,
        }
    }

    /// Recent uploads of `channel`, newest first
    ///
    /// At most `query_limit` items; at most `first_run_limit` when `first_run`.
    /// Never fails: exhausted or terminal listing errors degrade to whatever
    /// was parsed.
    pub async fn enumerate(&self, channel: &ChannelId, first_run: bool) -> Vec<VideoItem> {
        let url = channel.videos_url();
        let url = url.as_str();

        let mut items = match retry_with_backoff(&self.policy, |attempt| {
            self.attempt(channel, url, attempt)
        })
        .await
        {
            Ok(items) => items,
            Err(e) => {
                match &e {
                    ListError::MembersOnly { partial } => info!(
                        channel = %channel,
                        usable = partial.len(),
                        "Channel has members-only uploads, using the available ones"
                    ),
                    other => warn!(
                        channel = %channel,
                        lister = self.lister.name(),
                        error = %other,
                        "Listing failed, continuing with partial result"
                    ),
                }
                e.into_partial()
            }
        };

        items.truncate(self.query_limit);
        if first_run {
            items.truncate(self.first_run_limit);
        }
        items
    }

    /// One lister invocation, classified for the retry policy
    async fn attempt(
        &self,
        channel: &ChannelId,
        url: &str,
        attempt: u32,
    ) -> Result<Vec<VideoItem>, ListError> {
        let output = self.lister.list(url, self.query_limit).await?;
        let items = parse_listing(&output.stdout);

        if output.success {
            if output.stdout.trim().is_empty() {
                debug!(channel = %channel, "Lister returned no uploads");
            }
            return Ok(items);
        }

        debug!(
            channel = %channel,
            attempt = attempt + 1,
            exit_code = ?output.exit_code,
            parsed = items.len(),
            stderr = %output.stderr.trim(),
            "Lister exited with failure"
        );

        if !items.is_empty() {
            return Ok(items);
        }

        if output.stderr.contains(MEMBERS_ONLY_MARKER) {
            return Err(ListError::MembersOnly { partial: items });
        }

        Err(ListError::Failed {
            exit_code: output.exit_code,
            stderr: output.stderr,
            partial: items,
        })
    }
}
