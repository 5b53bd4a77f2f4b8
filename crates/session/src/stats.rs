//! Session run statistics

use std::fmt;

use contracts::{LinkSnapshot, SessionRecord};
use dispatcher::DispatchMetricsSnapshot;
use observability::DispatchSummary;
use sampler::SamplerMetricsSnapshot;

use crate::time::format_hms;

/// Statistics returned by `StreamingSession::stop`
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Final stored record
    pub record: SessionRecord,

    /// Link status at stop
    pub link: LinkSnapshot,

    /// Sampler tick counters
    pub sampler: SamplerMetricsSnapshot,

    /// Dispatch worker counters
    pub dispatch: DispatchMetricsSnapshot,

    /// Controller statistics (resolutions, latency, error kinds)
    pub summary: DispatchSummary,

    /// Worker finished without being aborted
    pub worker_drained: bool,
}

impl SessionStats {
    /// Frames built per second of session time
    pub fn tick_rate(&self) -> f64 {
        if self.record.duration_secs > 0 {
            self.sampler.ticks as f64 / self.record.duration_secs as f64
        } else {
            0.0
        }
    }

    /// Skipped frames as percentage of all ticks
    pub fn skip_rate(&self) -> f64 {
        if self.sampler.ticks > 0 {
            (self.sampler.skipped as f64 / self.sampler.ticks as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn crashed(&self) -> bool {
        self.record.crashed
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Session {} ===", self.record.session_id)?;
        writeln!(f, "Duration: {}", format_hms(self.record.duration_secs))?;
        writeln!(
            f,
            "Ticks: {} (enqueued {}, skipped {}, {:.2}% skipped)",
            self.sampler.ticks,
            self.sampler.enqueued,
            self.sampler.skipped,
            self.skip_rate()
        )?;
        writeln!(
            f,
            "Delivered: {}, node unavailable: {}, delivery failed: {}",
            self.summary.delivered, self.summary.node_unavailable, self.summary.delivery_failed
        )?;
        writeln!(
            f,
            "Final state: {} (node {})",
            self.link.state(),
            self.link
                .node
                .as_ref()
                .map(|n| n.host().to_string())
                .unwrap_or_else(|| "-".to_string())
        )?;
        write!(f, "{}", self.summary)
    }
}
