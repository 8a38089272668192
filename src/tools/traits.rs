//! Traits and types for the external lister and fetcher

use crate::error::{FetchError, ListError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Raw result of one lister invocation
///
/// A non-zero exit does not mean the output is empty or invalid; callers
/// parse `stdout` either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListerOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub exit_code: Option<i32>,
    /// One JSON record per line
    pub stdout: String,
    /// Diagnostic output
    pub stderr: String,
}

/// Parameters for one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Video URL
    pub url: String,
    /// Output path template; `%(ext)s` is replaced by the tool with the final extension
    pub output_template: PathBuf,
    /// Format-selection expression
    pub format: String,
}

/// Lists a channel's most recent uploads
#[async_trait]
pub trait ChannelLister: Send + Sync {
    /// Run the lister once for `channel_url`, asking for at most `limit` records
    ///
    /// # Errors
    ///
    /// Returns [`ListError::Spawn`] only if the process could not be run at all.
    /// A process that ran and failed is reported through [`ListerOutput::success`].
    async fn list(&self, channel_url: &str, limit: usize) -> Result<ListerOutput, ListError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Downloads one video to a local file
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Run the fetcher once
    ///
    /// `Ok(())` only means the tool exited zero; the caller verifies the file.
    async fn fetch(&self, request: &FetchRequest) -> Result<(), FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
