//! Append-only event log of download outcomes.

use crate::types::EventStatus;
use crate::{Error, Result};

use super::{Database, DownloadEvent, EventRow, NewEvent};

impl Database {
    /// Append one outcome row
    ///
    /// Always inserts; the same item may appear many times across cycles until
    /// it succeeds. Returns the new sequence id.
    pub async fn append_event(&self, event: &NewEvent<'_>) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO logs (item_id, channel_id, status, output_path, is_first_run_batch)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.item_id)
        .bind(event.channel_id)
        .bind(event.status.as_str())
        .bind(
            event
                .output_path
                .map(|p| p.to_string_lossy().into_owned()),
        )
        .bind(event.is_first_run_batch)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent events first
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<DownloadEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, item_id, channel_id, timestamp, status, output_path, is_first_run_batch
            FROM logs
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows.into_iter().map(DownloadEvent::from).collect())
    }

    /// All events for one item, oldest first
    pub async fn events_for_item(&self, item_id: &str) -> Result<Vec<DownloadEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, item_id, channel_id, timestamp, status, output_path, is_first_run_batch
            FROM logs
            WHERE item_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows.into_iter().map(DownloadEvent::from).collect())
    }

    /// Count events (optionally filtered by status)
    pub async fn count_events(&self, status: Option<EventStatus>) -> Result<i64> {
        let count = if let Some(status) = status {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM logs WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Sqlx)?
        } else {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM logs")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Sqlx)?
        };

        Ok(count)
    }
}
