//! Run statistics
//!
//! Counters are bumped by tasks as they run and read once the pool has
//! drained. They are monotonic tallies and never used for coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared by all tasks of a harvest
#[derive(Debug, Default)]
pub struct HarvestStats {
    pages_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    categories_queued: AtomicU64,
    records_written: AtomicU64,
    record_failures: AtomicU64,
    duplicates_skipped: AtomicU64,
    tasks_rejected: AtomicU64,
}

/// Point-in-time copy of [`HarvestStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pages_fetched: u64,
    pub fetch_failures: u64,
    pub categories_queued: u64,
    pub records_written: u64,
    pub record_failures: u64,
    pub duplicates_skipped: u64,
    pub tasks_rejected: u64,
}

impl HarvestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn category_queued(&self) {
        self.categories_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.record_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_skipped(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            categories_queued: self.categories_queued.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            record_failures: self.record_failures.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Logs a one-shot summary of a finished harvest
///
/// # Arguments
///
/// * `stats` - Final counter values
/// * `claimed_urls` - Size of the frontier at the end of the run
/// * `elapsed` - Wall-clock duration of the run
pub fn log_summary(stats: &StatsSnapshot, claimed_urls: usize, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.records_written as f64 / secs
    } else {
        0.0
    };

    tracing::info!(
        "Harvest finished in {:.1}s: {} record(s) written ({:.2}/sec), {} categories queued, {} URL(s) claimed",
        secs,
        stats.records_written,
        rate,
        stats.categories_queued,
        claimed_urls
    );
    tracing::info!(
        "Pages fetched: {}, fetch failures: {}, record failures: {}, duplicates skipped: {}, rejected tasks: {}",
        stats.pages_fetched,
        stats.fetch_failures,
        stats.record_failures,
        stats.duplicates_skipped,
        stats.tasks_rejected
    );
}
