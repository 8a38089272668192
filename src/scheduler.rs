//! Fixed-interval poll scheduling
//!
//! Runs a cycle once immediately, then again `interval` after each cycle
//! finishes, until the cancellation token fires. Cycles never overlap. A
//! cycle that returns an error is logged and the next one still fires on
//! schedule.
//!
//! # Example
//!
//! ```no_run
//! use channel_dl::scheduler::PollScheduler;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let cancel = CancellationToken::new();
//! let scheduler = PollScheduler::new(Duration::from_secs(30 * 60), cancel.clone());
//!
//! tokio::spawn(async move {
//!     channel_dl::shutdown_signal().await;
//!     cancel.cancel();
//! });
//!
//! scheduler
//!     .run(|| async { Ok(channel_dl::CycleReport::default()) })
//!     .await;
//! # }
//! ```

use crate::error::Result;
use crate::types::CycleReport;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Repeating trigger for poll cycles
pub struct PollScheduler {
    interval: Duration,
    cancel: CancellationToken,
}

impl PollScheduler {
    /// Creates a scheduler firing every `interval` until `cancel` is cancelled
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self { interval, cancel }
    }

    /// Run `cycle` immediately and then once per interval
    ///
    /// Returns the number of cycles started once cancellation is observed.
    /// Cancellation is checked before each cycle and while waiting; a cycle in
    /// progress is never interrupted here.
    pub async fn run<F, Fut>(&self, mut cycle: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CycleReport>>,
    {
        info!(interval_secs = self.interval.as_secs(), "Poll scheduler started");
        let mut cycles: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            cycles += 1;
            debug!(cycle = cycles, "Starting poll cycle");
            if let Err(e) = cycle().await {
                error!(cycle = cycles, error = %e, "Poll cycle failed");
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!(cycles, "Poll scheduler shutting down");
        cycles
    }
}
