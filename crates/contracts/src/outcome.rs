//! Dispatch outcome and controller state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one tick's dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Node accepted the frame
    Delivered,
    /// Resolution or health check failed, nothing sent
    NodeUnavailable,
    /// Frame sent but rejected, or transport error
    DeliveryFailed,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Delivered => "delivered",
            DispatchOutcome::NodeUnavailable => "node_unavailable",
            DispatchOutcome::DeliveryFailed => "delivery_failed",
        }
    }

    pub fn is_delivered(self) -> bool {
        self == DispatchOutcome::Delivered
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch controller state, evaluated once per tick before delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// No address known
    NoNode,
    /// Address cached, last dispatch succeeded or none attempted yet
    NodeKnown,
    /// Address cached, last dispatch failed
    NodeSuspect,
}

impl DispatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchState::NoNode => "no_node",
            DispatchState::NodeKnown => "node_known",
            DispatchState::NodeSuspect => "node_suspect",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
