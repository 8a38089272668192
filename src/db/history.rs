//! Download ledger: which item ids have already been retrieved.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::Database;

impl Database {
    /// True iff at least one ledger entry exists for the channel
    ///
    /// A channel without history is on its first run.
    pub async fn has_history(&self, channel_id: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM history WHERE channel_id = ? LIMIT 1")
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to check channel history: {}",
                        e
                    )))
                })?;

        Ok(found.is_some())
    }

    /// True if the item has already been downloaded
    pub async fn is_known(&self, item_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM history WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to check item history: {}",
                    e
                )))
            })?;

        Ok(found.is_some())
    }

    /// Record an item as downloaded
    ///
    /// Idempotent: recording an item that is already present is a no-op and
    /// keeps the original channel.
    pub async fn record_known(&self, item_id: &str, channel_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO history (item_id, channel_id) VALUES (?, ?)")
            .bind(item_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to record downloaded item: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Number of ledger entries, optionally for one channel
    pub async fn ledger_count(&self, channel_id: Option<&str>) -> Result<i64> {
        let count = if let Some(channel_id) = channel_id {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM history WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Sqlx)?
        } else {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM history")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Sqlx)?
        };

        Ok(count)
    }
}
