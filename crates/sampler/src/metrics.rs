//! Sampler counters

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Tick counters of one sampler run
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    ticks: AtomicU64,
    enqueued: AtomicU64,
    skipped: AtomicU64,
    discarded: AtomicU64,
    dispatch_lost: AtomicBool,
}

impl SamplerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a frame the closed dispatcher could not take
    ///
    /// Returns `true` for the first such frame.
    pub fn inc_discarded(&self) -> bool {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        !self.dispatch_lost.swap(true, Ordering::Relaxed)
    }

    /// Dispatch worker is gone, frames are no longer delivered
    pub fn dispatch_lost(&self) -> bool {
        self.dispatch_lost.load(Ordering::Relaxed)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> SamplerMetricsSnapshot {
        SamplerMetricsSnapshot {
            ticks: self.ticks(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sampler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerMetricsSnapshot {
    /// Frames built
    pub ticks: u64,
    /// Frames handed to the dispatcher
    pub enqueued: u64,
    /// Frames skipped because dispatch was busy
    pub skipped: u64,
    /// Frames dropped after the dispatch worker went away
    pub discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_discard_flags_dispatch_lost() {
        let metrics = SamplerMetrics::new();
        assert!(!metrics.dispatch_lost());

        assert!(metrics.inc_discarded());
        assert!(!metrics.inc_discarded());
        assert!(metrics.dispatch_lost());
        assert_eq!(metrics.snapshot().discarded, 2);
    }
}
