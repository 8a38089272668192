//! Configuration types for channel-dl
//!
//! Runtime settings are read from a TOML file and validated once at startup.
//! The numeric caps, the format expression and the proxy are required: a
//! missing key, a wrong type or a non-positive number is a fatal error, and all
//! missing keys are reported together.

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::ChannelId;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents written when no config file exists yet
pub const DEFAULT_CONFIG_TOML: &str = r#"# channel-dl configuration
# All keys below are required.

# Number of most recent uploads requested per channel
query_limit = 50
# Uploads downloaded the first time a channel is polled
first_run_limit = 10
# Poll interval in minutes
interval_min = 30
# yt-dlp format selection
download_format = "bestvideo*[filesize<100M][ext=mp4]+bestaudio"
# Attempts per listing/download before giving up for this cycle
max_retries = 3
# Proxy handed to yt-dlp
proxy = "socks5://127.0.0.1:10808"

# Optional settings
# download_dir = "downloads"
# temp_dir = "temp"
# database_path = "download_history.db"
# cookies_file = "youtube.cookie"
# ytdlp_path = "/usr/local/bin/yt-dlp"
# retry_unit_ms = 1000
# retry_jitter = false
"#;

/// Contents written when no channel list exists yet
pub const DEFAULT_CHANNELS_TXT: &str = "# Subscribed channels\n\
# Lines starting with # are comments\n\
# One channel handle per line (e.g. MoneyXYZ or @MoneyXYZ)\n\
# Example:\n\
# MoneyXYZ\n";

const REQUIRED_KEYS: [&str; 6] = [
    "query_limit",
    "first_run_limit",
    "interval_min",
    "download_format",
    "max_retries",
    "proxy",
];

/// Validated runtime configuration
///
/// Built once by [`Config::load`] or [`Config::from_toml_str`] and passed by
/// reference to each component at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Steady-state cap on items requested from the lister
    pub query_limit: usize,

    /// Cap applied the first time a channel is polled
    pub first_run_limit: usize,

    /// Attempts per external call
    pub max_retries: u32,

    /// Time between poll cycles
    pub interval: Duration,

    /// Format-selection expression passed to the fetcher
    pub download_format: String,

    /// Proxy passed to both external tools
    pub proxy: String,

    /// Final destination directory (local path or `\\server\share`)
    pub download_dir: PathBuf,

    /// Staging directory; when set, downloads land here and are moved after verification
    pub temp_dir: Option<PathBuf>,

    /// SQLite ledger location
    pub database_path: PathBuf,

    /// Cookie jar handed to both tools
    pub cookies_file: Option<PathBuf>,

    /// Explicit yt-dlp binary (discovered on PATH when unset)
    pub ytdlp_path: Option<PathBuf>,

    /// Base unit of the `2^attempt` backoff
    pub retry_unit: Duration,

    /// Stretch each backoff by a random factor of up to 2x
    pub retry_jitter: bool,
}

/// Raw file contents before validation
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    query_limit: Option<i64>,
    first_run_limit: Option<i64>,
    interval_min: Option<i64>,
    download_format: Option<String>,
    max_retries: Option<i64>,
    proxy: Option<String>,
    download_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    database_path: Option<PathBuf>,
    cookies_file: Option<PathBuf>,
    ytdlp_path: Option<PathBuf>,
    retry_unit_ms: Option<i64>,
    retry_jitter: Option<bool>,
}

impl RawConfig {
    fn missing_keys(&self) -> Vec<&'static str> {
        let present = [
            self.query_limit.is_some(),
            self.first_run_limit.is_some(),
            self.interval_min.is_some(),
            self.download_format.is_some(),
            self.max_retries.is_some(),
            self.proxy.is_some(),
        ];
        REQUIRED_KEYS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(key, _)| *key)
            .collect()
    }
}

impl Config {
    /// Load and validate the config file at `path`
    ///
    /// If the file does not exist, a commented default is written there and a
    /// [`Error::Config`] is returned asking the user to review it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            std::fs::write(path, DEFAULT_CONFIG_TOML)?;
            tracing::info!(path = %path.display(), "Created default config file");
            return Err(Error::Config {
                message: format!(
                    "created default config file {}; edit it and restart",
                    path.display()
                ),
                key: None,
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config { message, key } => Error::Config {
                message: format!("{} (in {})", message, path.display()),
                key,
            },
            other => other,
        })
    }

    /// Parse and validate TOML contents
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| Error::Config {
            message: format!("failed to parse config: {}", e.message()),
            key: None,
        })?;

        let missing = raw.missing_keys();
        if !missing.is_empty() {
            return Err(Error::Config {
                message: format!("missing required keys: {}", missing.join(", ")),
                key: missing.first().map(|k| k.to_string()),
            });
        }

        let query_limit = positive("query_limit", raw.query_limit)?;
        let first_run_limit = positive("first_run_limit", raw.first_run_limit)?;
        let interval_secs = positive("interval_min", raw.interval_min)?
            .checked_mul(60)
            .ok_or_else(|| Error::config_key("interval_min", "interval_min is too large"))?;
        let max_retries = positive("max_retries", raw.max_retries)?;
        let download_format = non_empty("download_format", raw.download_format)?;
        let proxy = non_empty("proxy", raw.proxy)?;
        let retry_unit_ms = match raw.retry_unit_ms {
            Some(ms) => positive("retry_unit_ms", Some(ms))?,
            None => 1000,
        };

        Ok(Self {
            query_limit: query_limit as usize,
            first_run_limit: first_run_limit as usize,
            max_retries: u32::try_from(max_retries)
                .map_err(|_| Error::config_key("max_retries", "max_retries is too large"))?,
            interval: Duration::from_secs(interval_secs),
            download_format,
            proxy,
            download_dir: raw
                .download_dir
                .unwrap_or_else(|| PathBuf::from("downloads")),
            temp_dir: raw.temp_dir,
            database_path: raw
                .database_path
                .unwrap_or_else(|| PathBuf::from("download_history.db")),
            cookies_file: raw.cookies_file,
            ytdlp_path: raw.ytdlp_path,
            retry_unit: Duration::from_millis(retry_unit_ms),
            retry_jitter: raw.retry_jitter.unwrap_or(false),
        })
    }

    /// Retry policy shared by the enumerator and the orchestrator
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            unit: self.retry_unit,
            jitter: self.retry_jitter,
        }
    }
}

fn positive(key: &str, value: Option<i64>) -> Result<u64> {
    match value {
        Some(v) if v > 0 => Ok(v as u64),
        _ => Err(Error::config_key(
            key,
            format!("{} must be a positive integer", key),
        )),
    }
}

fn non_empty(key: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::config_key(
            key,
            format!("{} must be a non-empty string", key),
        )),
    }
}

/// Read the channel list file
///
/// Lines are trimmed; blank lines and `#` comments are ignored. A missing file
/// is created with a commented placeholder and yields an empty list.
pub fn read_channel_list(path: &Path) -> Result<Vec<ChannelId>> {
    if !path.exists() {
        std::fs::write(path, DEFAULT_CHANNELS_TXT)?;
        tracing::warn!(
            path = %path.display(),
            "Created placeholder channel list; add channels and they will be picked up next cycle"
        );
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    Ok(parse_channel_list(&content))
}

/// Parse channel list contents (see [`read_channel_list`])
pub fn parse_channel_list(content: &str) -> Vec<ChannelId> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ChannelId::new)
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
query_limit = 50
first_run_limit = 10
interval_min = 30
download_format = "bestvideo*[filesize<100M][ext=mp4]+bestaudio"
max_retries = 3
proxy = "socks5://127.0.0.1:10808"
"#;

    #[test]
    fn valid_config_loads_with_defaults_for_optional_keys() {
        let config = Config::from_toml_str(VALID).unwrap();
        assert_eq!(config.query_limit, 50);
        assert_eq!(config.first_run_limit, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.interval, Duration::from_secs(30 * 60));
        assert_eq!(config.proxy, "socks5://127.0.0.1:10808");
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.database_path, PathBuf::from("download_history.db"));
        assert!(config.temp_dir.is_none());
        assert_eq!(config.retry_unit, Duration::from_secs(1));
    }

    #[test]
    fn missing_keys_are_reported_together() {
        let err = Config::from_toml_str(
            r#"
interval_min = 30
download_format = "test"
"#,
        )
        .unwrap_err();

        match err {
            Error::Config { message, key } => {
                assert_eq!(
                    message,
                    "missing required keys: query_limit, first_run_limit, max_retries, proxy"
                );
                assert_eq!(key.as_deref(), Some("query_limit"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_rejected() {
        let content = VALID.replace("query_limit = 50", "query_limit = \"invalid\"");
        let err = Config::from_toml_str(&content).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn non_positive_number_is_rejected_with_key() {
        let content = VALID.replace("max_retries = 3", "max_retries = 0");
        match Config::from_toml_str(&content).unwrap_err() {
            Error::Config { message, key } => {
                assert_eq!(key.as_deref(), Some("max_retries"));
                assert!(message.contains("positive integer"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn oversized_interval_is_rejected_with_key() {
        let content = VALID.replace("interval_min = 30", "interval_min = 9223372036854775807");
        match Config::from_toml_str(&content).unwrap_err() {
            Error::Config { message, key } => {
                assert_eq!(key.as_deref(), Some("interval_min"));
                assert_eq!(message, "interval_min is too large");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn retry_jitter_defaults_off_and_can_be_enabled() {
        assert!(!Config::from_toml_str(VALID).unwrap().retry_policy().jitter);

        let content = format!("{VALID}\nretry_jitter = true\n");
        let config = Config::from_toml_str(&content).unwrap();
        assert!(config.retry_jitter);
        assert!(config.retry_policy().jitter);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let content = format!("{VALID}\nquery_limt = 5\n");
        assert!(Config::from_toml_str(&content).is_err());
    }

    #[test]
    fn toml_syntax_error_is_fatal() {
        let err = Config::from_toml_str("invalid_toml = [").unwrap_err();
        match err {
            Error::Config { message, .. } => assert!(message.starts_with("failed to parse config")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_template_is_itself_valid() {
        let config = Config::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.query_limit, 50);
    }

    #[test]
    fn load_creates_default_file_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { key: None, .. }));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("query_limit = 50"));
        assert!(written.contains("proxy = \"socks5://127.0.0.1:10808\""));
    }

    #[test]
    fn optional_paths_and_retry_unit_are_read() {
        let content = format!(
            "{VALID}\ntemp_dir = \"staging\"\ndownload_dir = '\\\\nas\\share'\nretry_unit_ms = 5\n"
        );
        let config = Config::from_toml_str(&content).unwrap();
        assert_eq!(config.temp_dir, Some(PathBuf::from("staging")));
        assert_eq!(config.download_dir, PathBuf::from(r"\\nas\share"));
        assert_eq!(config.retry_policy().unit, Duration::from_millis(5));
        assert_eq!(config.retry_policy().max_attempts, 3);
    }

    #[test]
    fn channel_list_ignores_comments_and_blank_lines() {
        let channels = parse_channel_list(
            "# comment\nUC1234567890\n@handle\n  trimmed_id\n\n# another\n",
        );
        let ids: Vec<&str> = channels.iter().map(ChannelId::as_str).collect();
        assert_eq!(ids, vec!["@UC1234567890", "@handle", "@trimmed_id"]);
    }

    #[test]
    fn missing_channel_list_creates_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");

        let channels = read_channel_list(&path).unwrap();
        assert!(channels.is_empty());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# MoneyXYZ"));

        // The placeholder only holds comments
        assert!(read_channel_list(&path).unwrap().is_empty());
    }
}
