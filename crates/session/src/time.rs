//! Session duration helpers

use chrono::{DateTime, Utc};

/// Render seconds as `"{h}h:{m}m:{s}s"`
///
/// Negative input renders as zero.
pub fn format_hms(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours}h:{minutes}m:{seconds}s")
}

/// Whole seconds between two instants, truncated toward zero
pub fn total_secs(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds()
}
