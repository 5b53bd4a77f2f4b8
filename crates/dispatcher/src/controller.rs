//! DispatchController - per-frame node state machine
//!
//! Before every upload the controller looks at the link status:
//! - no node: resolve, deliver on success
//! - node known and last dispatch succeeded: deliver directly
//! - node known but last dispatch failed: validate, re-resolve if unhealthy
//!
//! Exactly one upload attempt per frame. Decisions are serialized by an
//! async gate held across the whole evaluation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use contracts::{
    DispatchOutcome, DispatchState, FrameUploader, HealthCheck, LinkStatus, NodeAddress,
    NodeDirectory, OutboundFrame,
};
use node_resolver::{NodeResolver, ResolveError};
use observability::metrics::{
    record_delivery_latency_ms, record_dispatch_outcome, record_link_error,
};
use observability::{DispatchAggregator, DispatchSummary};
use tracing::{debug, instrument, warn};

/// Node state machine in front of the uploader
pub struct DispatchController<C, U> {
    resolver: NodeResolver<C>,
    uploader: Arc<U>,
    gate: tokio::sync::Mutex<()>,
    stats: Mutex<DispatchAggregator>,
}

impl<C, U> DispatchController<C, U>
where
    C: NodeDirectory + HealthCheck + Send + Sync,
    U: FrameUploader + Send + Sync,
{
    pub fn new(resolver: NodeResolver<C>, uploader: Arc<U>) -> Self {
        Self {
            resolver,
            uploader,
            gate: tokio::sync::Mutex::new(()),
            stats: Mutex::new(DispatchAggregator::new()),
        }
    }

    pub fn resolver(&self) -> &NodeResolver<C> {
        &self.resolver
    }

    pub fn uploader(&self) -> &Arc<U> {
        &self.uploader
    }

    pub fn link(&self) -> &Arc<LinkStatus> {
        self.resolver.link()
    }

    pub fn state(&self) -> DispatchState {
        self.link().state()
    }

    fn stats(&self) -> MutexGuard<'_, DispatchAggregator> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch statistics so far
    pub fn summary(&self) -> DispatchSummary {
        self.stats().summary()
    }

    /// Resolve outside the per-frame path (session start)
    pub async fn resolve_now(&self) -> Result<NodeAddress, ResolveError> {
        let _gate = self.gate.lock().await;
        self.stats().resolutions += 1;
        self.resolver.resolve().await
    }

    /// Run the state machine for one frame and upload it at most once
    #[instrument(
        name = "dispatch_frame",
        skip(self, frame),
        fields(session = %frame.session_id(), tick = frame.tick())
    )]
    pub async fn dispatch(&self, frame: &OutboundFrame) -> DispatchOutcome {
        let _gate = self.gate.lock().await;

        let outcome = match self.select_node().await {
            None => {
                self.link().mark_failed();
                warn!("no node available, frame skipped");
                DispatchOutcome::NodeUnavailable
            }
            Some(node) => self.deliver(frame, &node).await,
        };

        self.stats().record_outcome(outcome);
        record_dispatch_outcome(outcome);
        outcome
    }

    async fn select_node(&self) -> Option<NodeAddress> {
        let snapshot = self.link().snapshot();
        debug!(state = %snapshot.state(), "evaluating link");

        match (snapshot.node, snapshot.last_dispatch_failed) {
            (Some(node), false) => Some(node),
            (Some(node), true) => {
                self.stats().validations += 1;
                if self.resolver.validate(&node).await {
                    Some(node)
                } else {
                    self.resolve().await
                }
            }
            (None, _) => self.resolve().await,
        }
    }

    async fn resolve(&self) -> Option<NodeAddress> {
        self.stats().resolutions += 1;
        self.resolver.resolve().await.ok()
    }

    async fn deliver(&self, frame: &OutboundFrame, node: &NodeAddress) -> DispatchOutcome {
        let started = Instant::now();
        let result = self.uploader.upload(frame, node).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(()) => {
                self.link().mark_delivered();
                self.stats().record_latency_ms(latency_ms);
                record_delivery_latency_ms(latency_ms);
                debug!(node = %node, latency_ms, "frame delivered");
                DispatchOutcome::Delivered
            }
            Err(e) => {
                self.link().mark_failed();
                self.stats().record_error(&e);
                record_link_error(&e);
                warn!(node = %node, error = %e, "delivery failed");
                DispatchOutcome::DeliveryFailed
            }
        }
    }
}
