//! LinkStatus - the only state shared between the dispatch path and observers
//!
//! Current node address and the "last dispatch failed" flag live behind one
//! lock so no caller can observe or update them separately.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{DispatchState, NodeAddress};

/// Copy of the link status at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSnapshot {
    /// Current node, `None` when unknown
    pub node: Option<NodeAddress>,
    /// Last dispatch failed (surfaced as the session "crashed" flag)
    pub last_dispatch_failed: bool,
}

impl LinkSnapshot {
    /// State the dispatch controller will act on
    pub fn state(&self) -> DispatchState {
        match (&self.node, self.last_dispatch_failed) {
            (None, _) => DispatchState::NoNode,
            (Some(_), false) => DispatchState::NodeKnown,
            (Some(_), true) => DispatchState::NodeSuspect,
        }
    }
}

/// Lock-guarded link status, owned per session and shared by handle
#[derive(Debug, Default)]
pub struct LinkStatus {
    inner: Mutex<LinkSnapshot>,
}

impl LinkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LinkSnapshot> {
        // The guarded data is two plain fields, a panicking holder cannot
        // leave it half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        self.lock().clone()
    }

    pub fn state(&self) -> DispatchState {
        self.lock().state()
    }

    pub fn current_node(&self) -> Option<NodeAddress> {
        self.lock().node.clone()
    }

    pub fn last_dispatch_failed(&self) -> bool {
        self.lock().last_dispatch_failed
    }

    /// Install a freshly resolved node
    pub fn set_node(&self, node: NodeAddress) {
        self.lock().node = Some(node);
    }

    /// Forget the current node and flag the failure
    pub fn clear_node(&self) {
        let mut guard = self.lock();
        guard.node = None;
        guard.last_dispatch_failed = true;
    }

    /// Record a successful delivery
    pub fn mark_delivered(&self) {
        self.lock().last_dispatch_failed = false;
    }

    /// Record a failed dispatch, the cached node is kept
    pub fn mark_failed(&self) {
        self.lock().last_dispatch_failed = true;
    }

    /// Back to the initial state (no node, no failure)
    pub fn reset(&self) {
        *self.lock() = LinkSnapshot::default();
    }
}
