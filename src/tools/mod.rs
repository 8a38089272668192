//! External tool capabilities
//!
//! Listing a channel and fetching a video are delegated to external processes.
//! Both are modelled as traits so the enumerator and orchestrator can be driven
//! by fakes in tests:
//!
//! - [`ChannelLister`]: emits one JSON record per line for a channel's recent uploads
//! - [`MediaFetcher`]: writes one media file for a video URL
//!
//! [`YtDlp`] implements both on top of the `yt-dlp` binary.
//!
//! ## Usage
//!
//! ```no_run
//! use channel_dl::tools::{ChannelLister, YtDlp};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ytdlp = YtDlp::new(PathBuf::from("/usr/local/bin/yt-dlp"), "socks5://127.0.0.1:10808");
//! let output = ytdlp.list("https://www.youtube.com/@alice/videos", 50).await?;
//! println!("{} bytes of listing", output.stdout.len());
//! # Ok(())
//! # }
//! ```

mod traits;
mod ytdlp;

pub use traits::{ChannelLister, FetchRequest, ListerOutput, MediaFetcher};
pub use ytdlp::{MEMBERS_ONLY_MARKER, YtDlp};
