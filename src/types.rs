//! Core domain types shared by the enumerator, orchestrator and coordinator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker that identifies a channel handle
pub const HANDLE_MARKER: char = '@';

/// A configured channel, identified by its handle
///
/// The identifier is normalized on construction: a value that already starts
/// with `@` is kept as-is, any bare token gets the marker prepended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// Normalize a raw identifier from the channel list
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with(HANDLE_MARKER) {
            Self(raw.to_string())
        } else {
            Self(format!("{HANDLE_MARKER}{raw}"))
        }
    }

    /// The normalized identifier (always starts with `@`)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of the channel's uploads listing
    pub fn videos_url(&self) -> String {
        format!("https://www.youtube.com/{}/videos", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One video discovered in a channel listing
///
/// Items are sourced fresh every cycle; only `video_id` is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    /// Stable unique video id
    pub video_id: String,
    /// Title with path separators replaced
    pub title: String,
    /// Upload date as `YYYYMMDD` (may be empty if the lister omitted it)
    pub upload_date: String,
    /// Uploader display name with path separators replaced
    pub channel_name: String,
}

impl VideoItem {
    /// Watch URL handed to the fetcher
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Outcome recorded in the event log for one download attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// File downloaded and verified
    Success,
    /// Download failed after all attempts
    Failed,
}

impl EventStatus {
    /// String stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Success => "success",
            EventStatus::Failed => "failed",
        }
    }

    /// Parse the `status` column; unknown values are treated as failures
    pub fn from_db(value: &str) -> Self {
        match value {
            "success" => EventStatus::Success,
            _ => EventStatus::Failed,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals for one pass over all channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Channels that were processed
    pub channels: usize,
    /// Items downloaded and recorded in the ledger
    pub downloaded: usize,
    /// Items whose download failed (eligible again next cycle)
    pub failed: usize,
    /// Items skipped because the ledger already held them
    pub skipped: usize,
}
