//! Session identity and persisted session metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monitoring session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u32);

impl SessionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Identifier following this one
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session metadata written to the local store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    /// Equal to `started_at` until the session is stopped
    pub finished_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub band_connected: bool,
    pub watch_connected: bool,
    pub board_connected: bool,
    #[serde(default)]
    pub description: String,
    /// Whether the session was streamed to the backend
    pub synced: bool,
    /// Last dispatch had failed when the session ended
    pub crashed: bool,
}

impl SessionRecord {
    /// True once `finished_at` was set by a stop
    pub fn is_finished(&self) -> bool {
        self.finished_at > self.started_at || self.duration_secs > 0
    }
}
