//! Dispatch queue metrics
//!
//! Queue-side counters only. Outcome counts live in the controller's
//! `DispatchAggregator`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Counters shared by the frame senders and the dispatch worker
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Frames accepted into the queue
    enqueued: AtomicU64,
    /// Frames skipped because the queue was full
    skipped: AtomicU64,
    /// Frames the worker took off the queue
    dequeued: AtomicU64,
    /// A dispatch is running on the worker
    in_flight: AtomicBool,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_in_flight(&self, in_flight: bool) {
        self.in_flight.store(in_flight, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            queue_len: self.queue_len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch queue metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetricsSnapshot {
    pub queue_len: usize,
    pub enqueued: u64,
    pub skipped: u64,
    pub dequeued: u64,
}

impl DispatchMetricsSnapshot {
    /// Accepted frames the worker never picked up
    pub fn undelivered(&self) -> u64 {
        self.enqueued.saturating_sub(self.dequeued)
    }
}
