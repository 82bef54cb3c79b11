//! Logger metrics for observability
//!
//! Counters describing what happened to submitted messages: how many were
//! queued, dropped by the logger pre-filter, written by devices, discarded
//! by a device's severity gate, failed inside a device, or refused because
//! the logger had already stopped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for pipeline observability
///
/// `submitted`, `prefiltered` and `rejected` count `log` calls. `delivered`,
/// `discarded` and `failed` count device attempts: one message fanned out to
/// three devices adds three to their sum.
///
/// # Example
///
/// ```
/// use rust_device_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_submitted();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Messages accepted into the queue
    submitted: AtomicU64,

    /// Successful device writes
    delivered: AtomicU64,

    /// Messages dropped by the logger pre-filter before queueing
    prefiltered: AtomicU64,

    /// Per-device drops by a device's severity gate
    discarded: AtomicU64,

    /// Device writes that returned an error or panicked
    failed: AtomicU64,

    /// `log` calls refused after shutdown
    rejected: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            prefiltered: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn prefiltered(&self) -> u64 {
        self.prefiltered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Record a queued message
    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful device write
    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a message dropped before it reached the queue
    #[inline]
    pub fn record_prefiltered(&self) -> u64 {
        self.prefiltered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record one device gate turning a message away
    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a failed device write
    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a message refused after shutdown
    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    /// Get failure rate over attempted writes as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no writes have been attempted.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.prefiltered.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted()),
            delivered: AtomicU64::new(self.delivered()),
            prefiltered: AtomicU64::new(self.prefiltered()),
            discarded: AtomicU64::new(self.discarded()),
            failed: AtomicU64::new(self.failed()),
            rejected: AtomicU64::new(self.rejected()),
        }
    }
}
