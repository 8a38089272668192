//! `yt-dlp` backed lister and fetcher

use super::traits::{ChannelLister, FetchRequest, ListerOutput, MediaFetcher};
use crate::config::Config;
use crate::error::{Error, FetchError, ListError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

/// Diagnostic text yt-dlp prints when a listing hits members-only uploads
///
/// Matching on it is a best-effort heuristic; the wording is not guaranteed stable.
pub const MEMBERS_ONLY_MARKER: &str = "This video is available to this channel's members";

/// Container the fetcher remuxes into
const REMUX_FORMAT: &str = "mp4";

/// Runs the external `yt-dlp` binary for both listing and fetching
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary_path: PathBuf,
    proxy: String,
    cookies_file: Option<PathBuf>,
}

impl YtDlp {
    /// Create a handle for an explicit binary path
    pub fn new(binary_path: PathBuf, proxy: impl Into<String>) -> Self {
        Self {
            binary_path,
            proxy: proxy.into(),
            cookies_file: None,
        }
    }

    /// Attempt to find `yt-dlp` in PATH
    pub fn from_path(proxy: impl Into<String>) -> Option<Self> {
        which::which("yt-dlp")
            .ok()
            .map(|path| Self::new(path, proxy))
    }

    /// Build from configuration: explicit `ytdlp_path` first, PATH lookup otherwise
    pub fn from_config(config: &Config) -> Result<Self> {
        let ytdlp = match &config.ytdlp_path {
            Some(path) => Self::new(path.clone(), config.proxy.clone()),
            None => Self::from_path(config.proxy.clone()).ok_or_else(|| {
                Error::ExternalTool(
                    "yt-dlp not found in PATH; install it or set ytdlp_path in config".into(),
                )
            })?,
        };
        Ok(ytdlp.with_cookies(config.cookies_file.clone()))
    }

    /// Pass a cookie jar to every invocation
    pub fn with_cookies(mut self, cookies_file: Option<PathBuf>) -> Self {
        self.cookies_file = cookies_file;
        self
    }

    fn common_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.into());
        }
        args.push("--proxy".into());
        args.push(self.proxy.clone().into());
        args
    }

    /// Arguments for a listing run
    pub fn list_args(&self, channel_url: &str, limit: usize) -> Vec<OsString> {
        let mut args = self.common_args();
        args.extend([
            "--playlist-end".into(),
            limit.to_string().into(),
            "--dump-json".into(),
            channel_url.into(),
        ]);
        args
    }

    /// Arguments for a fetch run
    pub fn fetch_args(&self, request: &FetchRequest) -> Vec<OsString> {
        let mut args = self.common_args();
        args.extend([
            "-f".into(),
            request.format.clone().into(),
            "--remux-video".into(),
            REMUX_FORMAT.into(),
            "--no-playlist".into(),
            "--mark-watched".into(),
            "-o".into(),
            request.output_template.clone().into(),
            request.url.clone().into(),
        ]);
        args
    }
}

#[async_trait]
impl ChannelLister for YtDlp {
    async fn list(&self, channel_url: &str, limit: usize) -> std::result::Result<ListerOutput, ListError> {
        let output = Command::new(&self.binary_path)
            .args(self.list_args(channel_url, limit))
            .output()
            .await
            .map_err(|e| ListError::Spawn(format!("Failed to execute yt-dlp: {}", e)))?;

        Ok(ListerOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<(), FetchError> {
        let output = Command::new(&self.binary_path)
            .args(self.fetch_args(request))
            .output()
            .await
            .map_err(|e| FetchError::Spawn(format!("Failed to execute yt-dlp: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(
            url = %request.url,
            exit_code = ?output.status.code(),
            stderr = %stderr.trim(),
            "yt-dlp fetch failed (an outdated yt-dlp is a common cause; try `yt-dlp -U`)"
        );
        Err(FetchError::NonZeroExit {
            exit_code: output.status.code(),
        })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
