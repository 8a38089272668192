//! Database layer for channel-dl
//!
//! Handles SQLite persistence for the download ledger and the event log.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, idempotent schema creation
//! - [`history`]: The ledger of downloaded item ids (dedup)
//! - [`events`]: Append-only log of download outcomes
//!
//! The store is single-writer: a cycle runs channel by channel and item by
//! item, and every statement is committed on its own.

use crate::types::EventStatus;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};
use std::path::PathBuf;

mod events;
mod history;
mod migrations;

/// New event log row
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    /// Item the attempt was for
    pub item_id: &'a str,
    /// Channel the item was listed under
    pub channel_id: &'a str,
    /// Outcome of the attempt
    pub status: EventStatus,
    /// Final file location on success
    pub output_path: Option<&'a std::path::Path>,
    /// Whether the item was part of the channel's first-ever batch
    pub is_first_run_batch: bool,
}

/// Event log record (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    /// Monotonic sequence id
    pub id: i64,
    /// Item the attempt was for
    pub item_id: String,
    /// Channel the item was listed under
    pub channel_id: String,
    /// Unix timestamp set by SQLite on insert
    pub timestamp: i64,
    /// `success` or `failed`
    pub status: String,
    /// Final file location on success
    pub output_path: Option<String>,
    /// Whether the item was part of the channel's first-ever batch
    pub is_first_run_batch: bool,
}

/// Event log entry
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadEvent {
    /// Monotonic sequence id
    pub id: i64,
    /// Item the attempt was for
    pub item_id: String,
    /// Channel the item was listed under
    pub channel_id: String,
    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
    /// Outcome of the attempt
    pub status: EventStatus,
    /// Final file location on success
    pub output_path: Option<PathBuf>,
    /// Whether the item was part of the channel's first-ever batch
    pub is_first_run_batch: bool,
}

impl From<EventRow> for DownloadEvent {
    fn from(row: EventRow) -> Self {
        DownloadEvent {
            id: row.id,
            item_id: row.item_id,
            channel_id: row.channel_id,
            timestamp: Utc
                .timestamp_opt(row.timestamp, 0)
                .single()
                .unwrap_or_else(Utc::now),
            status: EventStatus::from_db(&row.status),
            output_path: row.output_path.map(PathBuf::from),
            is_first_run_batch: row.is_first_run_batch,
        }
    }
}

/// Database handle for channel-dl
pub struct Database {
    pool: SqlitePool,
}
