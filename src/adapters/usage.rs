//! Usage tracking for language-model calls.
//!
//! `UsageMonitor` keeps request and token counters behind one lock so any
//! number of concurrent extractions can report into it and every snapshot
//! is consistent. Counters reset when the UTC day changes; the reset check
//! runs on a background task that is started and stopped explicitly.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default interval between day-change checks
pub const DEFAULT_RESET_CHECK: Duration = Duration::from_secs(60 * 60);

/// Sink for usage reports
pub trait UsageTracker: Send + Sync {
    /// Record one successful extraction that consumed `tokens`
    fn record(&self, tokens: u64) -> Result<()>;
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub tokens: u64,
    pub last_reset: DateTime<Utc>,
}

/// In-process usage counters with a daily reset
pub struct UsageMonitor {
    counters: Mutex<UsageSnapshot>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for UsageMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageMonitor {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(UsageSnapshot {
                requests: 0,
                tokens: 0,
                last_reset: Utc::now(),
            }),
            reset_task: Mutex::new(None),
        }
    }

    fn counters(&self) -> MutexGuard<'_, UsageSnapshot> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current counter values
    pub fn snapshot(&self) -> UsageSnapshot {
        self.counters().clone()
    }

    /// Zero the counters
    pub fn reset(&self, now: DateTime<Utc>) {
        *self.counters() = UsageSnapshot {
            requests: 0,
            tokens: 0,
            last_reset: now,
        };
        info!("Usage counters reset");
    }

    /// Reset if `now` falls on a later UTC day than the last reset.
    ///
    /// Returns true if a reset happened.
    pub fn reset_if_new_day(&self, now: DateTime<Utc>) -> bool {
        let mut counters = self.counters();
        if now.date_naive() > counters.last_reset.date_naive() {
            *counters = UsageSnapshot {
                requests: 0,
                tokens: 0,
                last_reset: now,
            };
            drop(counters);
            info!("Usage counters reset");
            return true;
        }
        false
    }

    /// Start the background reset check. Calling twice is a no-op.
    pub fn start(self: &Arc<Self>, check_every: Duration) {
        let mut task = self.reset_task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return;
        }

        // Weak so dropping the last handle stops the task
        let monitor = Arc::downgrade(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_every);
            loop {
                ticker.tick().await;
                match monitor.upgrade() {
                    Some(monitor) => {
                        monitor.reset_if_new_day(Utc::now());
                    }
                    None => break,
                }
            }
        }));
        debug!(?check_every, "Usage reset task started");
    }

    /// Stop the background reset check
    pub fn stop(&self) {
        if let Some(handle) = self
            .reset_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
            debug!("Usage reset task stopped");
        }
    }

    /// Whether the background task is running
    pub fn is_running(&self) -> bool {
        self.reset_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl UsageTracker for UsageMonitor {
    fn record(&self, tokens: u64) -> Result<()> {
        let mut counters = self.counters();
        counters.requests += 1;
        counters.tokens += tokens;
        Ok(())
    }
}

impl Drop for UsageMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
