// Rebuild metrics module
//
// Lightweight counters for the rebuild scheduler

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Rebuild scheduler metrics
///
/// Uses atomic operations so the worker thread and the control thread can both
/// record without locks. Logged on shutdown or on demand.
#[derive(Debug)]
pub struct RebuildMetrics {
    /// Total rebuild requests received
    pub requests: AtomicU64,

    /// Requests folded into an already scheduled follow-up
    pub coalesced: AtomicU64,

    /// Executions started
    pub started: AtomicU64,

    /// Executions that published a snapshot
    pub completed: AtomicU64,

    /// Executions that failed (error or panic)
    pub failed: AtomicU64,

    /// Files indexed by the last successful pass
    pub files_indexed: AtomicUsize,

    /// Total build time in milliseconds
    pub total_build_time_ms: AtomicU64,

    start_time: Instant,
}

impl RebuildMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            files_indexed: AtomicUsize::new(0),
            total_build_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful pass and its size
    pub fn record_completed(&self, files: usize, duration: Duration) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.files_indexed.store(files, Ordering::Relaxed);
        self.record_build_time(duration);
    }

    pub fn record_failed(&self, duration: Duration) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.record_build_time(duration);
    }

    fn record_build_time(&self, duration: Duration) {
        self.total_build_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time per finished execution in milliseconds
    pub fn avg_build_time_ms(&self) -> f64 {
        let total = self.total_build_time_ms.load(Ordering::Relaxed);
        let count =
            self.completed.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Rebuild Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Requests: {} ({} coalesced)",
            self.requests.load(Ordering::Relaxed),
            self.coalesced.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Executions: {} started, {} completed, {} failed",
            self.started.load(Ordering::Relaxed),
            self.completed.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Last pass indexed {} files; total build time {:.2}s (avg: {:.2}ms)",
            self.files_indexed.load(Ordering::Relaxed),
            self.total_build_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_build_time_ms()
        );
    }
}

impl Default for RebuildMetrics {
    fn default() -> Self {
        Self::new()
    }
}
