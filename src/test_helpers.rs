//! Shared test fakes for the external tools and a temp-dir backed setup.

use crate::config::Config;
use crate::db::Database;
use crate::error::{FetchError, ListError};
use crate::retry::RetryPolicy;
use crate::tools::{ChannelLister, FetchRequest, ListerOutput, MediaFetcher};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Retry policy with a 1ms unit so backoff never slows tests down
pub(crate) fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        unit: Duration::from_millis(1),
        jitter: false,
    }
}

/// Config with small caps, a 1ms retry unit and direct downloads into `download_dir`
pub(crate) fn test_config(download_dir: &Path) -> Config {
    Config {
        query_limit: 50,
        first_run_limit: 10,
        max_retries: 3,
        interval: Duration::from_secs(60),
        download_format: "best".to_string(),
        proxy: "socks5://127.0.0.1:1080".to_string(),
        download_dir: download_dir.to_path_buf(),
        temp_dir: None,
        database_path: download_dir.join("history.db"),
        cookies_file: None,
        ytdlp_path: None,
        retry_unit: Duration::from_millis(1),
        retry_jitter: false,
    }
}

/// One JSON listing line for a video
pub(crate) fn video_line(id: &str, title: &str) -> String {
    serde_json::json!({
        "_type": "video",
        "id": id,
        "title": title,
        "upload_date": "20250101",
        "uploader": "Test Channel",
    })
    .to_string()
}

/// Listing output holding the given ids, newest first
pub(crate) fn listing(ids: &[&str]) -> String {
    ids.iter()
        .map(|id| video_line(id, &format!("Title {id}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Successful lister output
pub(crate) fn ok_output(stdout: impl Into<String>) -> ListerOutput {
    ListerOutput {
        success: true,
        exit_code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

/// Failed lister output
pub(crate) fn failed_output(stdout: impl Into<String>, stderr: impl Into<String>) -> ListerOutput {
    ListerOutput {
        success: false,
        exit_code: Some(1),
        stdout: stdout.into(),
        stderr: stderr.into(),
    }
}

/// Lister that replays scripted outputs in order and records every call
///
/// When the script runs out, the last output is repeated.
pub(crate) struct ScriptedLister {
    script: Mutex<VecDeque<ListerOutput>>,
    last: Mutex<Option<ListerOutput>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedLister {
    pub(crate) fn new(script: Vec<ListerOutput>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(channel_url, limit)` for every invocation
    pub(crate) fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelLister for ScriptedLister {
    async fn list(&self, channel_url: &str, limit: usize) -> Result<ListerOutput, ListError> {
        self.calls
            .lock()
            .unwrap()
            .push((channel_url.to_string(), limit));

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        let output = match next {
            Some(output) => output,
            None => last.clone().unwrap_or_default(),
        };
        *last = Some(output.clone());
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// What the fake fetcher does for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchBehavior {
    /// Exit zero and write the `.mp4` the template points at
    WriteFile,
    /// Exit zero without writing anything
    ExitZeroNoFile,
    /// Exit non-zero
    Fail,
}

/// Fetcher that follows a script and records every request
///
/// When the script runs out, `default` is used.
pub(crate) struct FakeFetcher {
    script: Mutex<VecDeque<FetchBehavior>>,
    default: FetchBehavior,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeFetcher {
    pub(crate) fn new(default: FetchBehavior) -> Self {
        Self::scripted(vec![], default)
    }

    pub(crate) fn scripted(script: Vec<FetchBehavior>, default: FetchBehavior) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Video URLs fetched, in call order
    pub(crate) fn fetched_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

/// Path the template resolves to for an `.mp4` output
pub(crate) fn resolve_template(template: &Path) -> PathBuf {
    PathBuf::from(template.to_string_lossy().replace("%(ext)s", "mp4"))
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<(), FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default);

        match behavior {
            FetchBehavior::WriteFile => {
                let path = resolve_template(&request.output_template);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(&path, b"fake media").unwrap();
                Ok(())
            }
            FetchBehavior::ExitZeroNoFile => Ok(()),
            FetchBehavior::Fail => Err(FetchError::NonZeroExit { exit_code: Some(1) }),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Fresh database inside a temp dir; keep the returned dir alive
pub(crate) async fn create_test_database() -> (Database, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();
    (db, temp_dir)
}
