//! Common test utilities for channel-dl integration tests
//!
//! Fake tools that never spawn a process, plus a temp-dir backed setup that
//! wires them into a real [`CycleCoordinator`] and SQLite file.

#![allow(dead_code)]

use async_trait::async_trait;
use channel_dl::{
    ChannelEnumerator, ChannelId, ChannelLister, Config, CycleCoordinator, Database,
    DownloadOrchestrator, FetchError, FetchRequest, ListError, ListerOutput, MediaFetcher,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// One listing line in the shape yt-dlp's `--dump-json` prints
pub fn video_line(channel_name: &str, id: &str) -> String {
    serde_json::json!({
        "_type": "video",
        "id": id,
        "title": format!("Upload {id}"),
        "upload_date": "20250301",
        "uploader": channel_name,
        "duration": 600,
    })
    .to_string()
}

/// Listing holding `ids` newest first
pub fn listing(channel_name: &str, ids: &[&str]) -> String {
    ids.iter()
        .map(|id| video_line(channel_name, id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Successful lister output
pub fn ok(stdout: String) -> ListerOutput {
    ListerOutput {
        success: true,
        exit_code: Some(0),
        stdout,
        stderr: String::new(),
    }
}

/// Failed lister output
pub fn failed(stdout: String, stderr: &str) -> ListerOutput {
    ListerOutput {
        success: false,
        exit_code: Some(1),
        stdout,
        stderr: stderr.to_string(),
    }
}

/// Lister with a queue of outputs per channel URL
///
/// The last output of each queue repeats; unknown channels get an empty
/// successful listing.
#[derive(Default)]
pub struct FakeLister {
    outputs: Mutex<HashMap<String, VecDeque<ListerOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outputs for `channel`
    pub fn script(&self, channel: &str, outputs: Vec<ListerOutput>) {
        self.outputs
            .lock()
            .unwrap()
            .insert(ChannelId::new(channel).videos_url(), outputs.into());
    }

    /// Channel URLs listed, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelLister for FakeLister {
    async fn list(&self, channel_url: &str, _limit: usize) -> Result<ListerOutput, ListError> {
        self.calls.lock().unwrap().push(channel_url.to_string());

        let mut outputs = self.outputs.lock().unwrap();
        let Some(queue) = outputs.get_mut(channel_url) else {
            return Ok(ok(String::new()));
        };
        let output = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(output.unwrap_or_else(|| ok(String::new())))
    }

    fn name(&self) -> &'static str {
        "fake-lister"
    }
}

/// Fetcher that writes the expected `.mp4` unless the video id is marked failing
#[derive(Default)]
pub struct FakeFetcher {
    failing: Mutex<HashSet<String>>,
    silent: Mutex<HashSet<String>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit non-zero for this video id
    pub fn fail(&self, video_id: &str) {
        self.failing.lock().unwrap().insert(video_id.to_string());
    }

    /// Exit zero without writing a file for this video id
    pub fn exit_zero_without_file(&self, video_id: &str) {
        self.silent.lock().unwrap().insert(video_id.to_string());
    }

    /// Make a previously failing id succeed
    pub fn heal(&self, video_id: &str) {
        self.failing.lock().unwrap().remove(video_id);
        self.silent.lock().unwrap().remove(video_id);
    }

    /// Video ids requested, in call order (one entry per attempt)
    pub fn fetched_ids(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| video_id_of(&r.url))
            .collect()
    }
}

fn video_id_of(url: &str) -> String {
    url.rsplit("v=").next().unwrap_or_default().to_string()
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<(), FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        let id = video_id_of(&request.url);

        if self.failing.lock().unwrap().contains(&id) {
            return Err(FetchError::NonZeroExit { exit_code: Some(1) });
        }
        if self.silent.lock().unwrap().contains(&id) {
            return Ok(());
        }

        let path = PathBuf::from(
            request
                .output_template
                .to_string_lossy()
                .replace("%(ext)s", "mp4"),
        );
        tokio::fs::write(&path, b"fake media").await.unwrap();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake-fetcher"
    }
}

/// Config pointing every path into `root`, with a 1ms backoff unit
pub fn test_config(root: &Path) -> Config {
    let content = format!(
        r#"
query_limit = 50
first_run_limit = 10
interval_min = 1
download_format = "best"
max_retries = 3
proxy = "socks5://127.0.0.1:1080"
download_dir = "{}"
database_path = "{}"
retry_unit_ms = 1
"#,
        root.join("downloads").display(),
        root.join("history.db").display(),
    );
    Config::from_toml_str(&content).unwrap()
}

/// Everything one integration test needs; keep `dir` alive for the test
pub struct TestHarness {
    pub coordinator: CycleCoordinator,
    pub db: Arc<Database>,
    pub lister: Arc<FakeLister>,
    pub fetcher: Arc<FakeFetcher>,
    pub cancel: CancellationToken,
    pub config: Config,
    pub dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build with a tweaked config
    pub async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        tweak(&mut config);

        let db = Arc::new(Database::new(&config.database_path).await.unwrap());
        let lister = Arc::new(FakeLister::new());
        let fetcher = Arc::new(FakeFetcher::new());
        let cancel = CancellationToken::new();

        let coordinator = CycleCoordinator::new(
            db.clone(),
            ChannelEnumerator::new(lister.clone(), &config),
            DownloadOrchestrator::new(fetcher.clone(), &config),
            cancel.clone(),
        );

        Self {
            coordinator,
            db,
            lister,
            fetcher,
            cancel,
            config,
            dir,
        }
    }

    /// Give up waiting on slow cycles after this long
    pub const TIMEOUT: Duration = Duration::from_secs(30);
}
