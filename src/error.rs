//! Error types for channel-dl
//!
//! This module provides the error handling for the library:
//! - A crate-wide [`Error`] with contextual variants (config key, tool output, etc.)
//! - [`ListError`] and [`FetchError`] for the two external tools, each classified
//!   as retryable or terminal through [`IsRetryable`](crate::retry::IsRetryable)
//! - [`DatabaseError`] for connection, migration and query failures

use crate::types::VideoItem;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for channel-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for channel-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "query_limit")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Media fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// External tool could not be located or executed
    #[error("external tool error: {0}")]
    ExternalTool(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Outcome of a single listing attempt that did not produce a usable batch
///
/// Every variant that can carry output keeps the items that were parsed before
/// the failure so the caller can degrade to a partial result.
#[derive(Debug, Error)]
pub enum ListError {
    /// Lister exited non-zero without a recognised marker
    #[error("lister exited with {exit_code:?}: {stderr}")]
    Failed {
        /// Process exit code, if the process was not killed by a signal
        exit_code: Option<i32>,
        /// Diagnostic output from the lister
        stderr: String,
        /// Items parsed from standard output despite the failure
        partial: Vec<VideoItem>,
    },

    /// Listing was cut short by members-only content
    #[error("channel listing blocked by members-only content ({} items usable)", partial.len())]
    MembersOnly {
        /// Items parsed before the listing stopped
        partial: Vec<VideoItem>,
    },

    /// Lister process could not be started
    #[error("failed to run lister: {0}")]
    Spawn(String),
}

impl ListError {
    /// Consume the error, returning whatever items it carried
    pub fn into_partial(self) -> Vec<VideoItem> {
        match self {
            ListError::Failed { partial, .. } | ListError::MembersOnly { partial } => partial,
            ListError::Spawn(_) => Vec::new(),
        }
    }
}

/// Media fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Fetcher exited non-zero
    #[error("fetcher exited with {exit_code:?}")]
    NonZeroExit {
        /// Process exit code, if the process was not killed by a signal
        exit_code: Option<i32>,
    },

    /// Fetcher process could not be started
    #[error("failed to run fetcher: {0}")]
    Spawn(String),

    /// Fetcher reported success but the expected file is missing
    #[error("fetcher reported success but {path} does not exist")]
    OutputMissing {
        /// Path where the output file was expected
        path: PathBuf,
    },

    /// Verified file could not be moved to its final destination
    #[error("failed to move {source_path} to {dest_path}: {reason}")]
    MoveFailed {
        /// Staged file
        source_path: PathBuf,
        /// Final destination
        dest_path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },
}
