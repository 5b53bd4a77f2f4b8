//! DispatchHandle - owns the controller worker and its hand-off queue

use std::sync::Arc;
use std::time::Duration;

use contracts::{FrameUploader, HealthCheck, NodeDirectory, OutboundFrame};
use observability::metrics::record_frame_skipped;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::controller::DispatchController;
use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;

/// Cloneable, non-blocking entry point of the dispatch queue
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<OutboundFrame>,
    metrics: Arc<DispatchMetrics>,
}

impl FrameSender {
    /// Hand a frame to the worker without waiting
    ///
    /// A full queue skips the frame and counts it.
    pub fn try_send(&self, frame: OutboundFrame) -> Result<(), DispatcherError> {
        let tick = frame.tick();
        match self.tx.try_send(frame) {
            Ok(()) => {
                self.metrics.inc_enqueued();
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.inc_skipped();
                record_frame_skipped();
                debug!(tick, "dispatch busy, frame skipped");
                Err(DispatcherError::QueueFull { tick })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(tick, "dispatch worker closed unexpectedly");
                Err(DispatcherError::WorkerClosed { tick })
            }
        }
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }
}

/// Handle to a running dispatch worker
pub struct DispatchHandle {
    sender: FrameSender,
    metrics: Arc<DispatchMetrics>,
    worker_handle: JoinHandle<()>,
}

impl DispatchHandle {
    /// Spawn the worker task
    ///
    /// `queue_capacity` below one is raised to one.
    pub fn spawn<C, U>(controller: Arc<DispatchController<C, U>>, queue_capacity: usize) -> Self
    where
        C: NodeDirectory + HealthCheck + Send + Sync + 'static,
        U: FrameUploader + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(DispatchMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_handle = tokio::spawn(async move {
            dispatch_worker(controller, rx, worker_metrics).await;
        });

        Self {
            sender: FrameSender {
                tx,
                metrics: Arc::clone(&metrics),
            },
            metrics,
            worker_handle,
        }
    }

    /// New sender for the sampler
    pub fn sender(&self) -> FrameSender {
        self.sender.clone()
    }

    pub fn try_send(&self, frame: OutboundFrame) -> Result<(), DispatcherError> {
        self.sender.try_send(frame)
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Stop accepting frames and wait for the worker
    ///
    /// Queued frames and the in-flight dispatch are allowed to finish within
    /// `grace`; after that the worker is aborted. Other live `FrameSender`
    /// clones keep the queue open until they are dropped.
    ///
    /// Returns `true` when the worker finished on its own.
    #[instrument(name = "dispatch_handle_shutdown", skip(self))]
    pub async fn shutdown(self, grace: Duration) -> bool {
        let Self {
            sender,
            mut worker_handle,
            ..
        } = self;
        drop(sender);

        match tokio::time::timeout(grace, &mut worker_handle).await {
            Ok(Ok(())) => {
                debug!("dispatch worker stopped");
                true
            }
            Ok(Err(e)) => {
                error!(error = ?e, "dispatch worker panicked");
                false
            }
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "dispatch worker did not stop in time, aborting");
                worker_handle.abort();
                false
            }
        }
    }
}

/// Worker task: one frame at a time through the controller
#[instrument(name = "dispatch_worker_loop", skip_all)]
async fn dispatch_worker<C, U>(
    controller: Arc<DispatchController<C, U>>,
    mut rx: mpsc::Receiver<OutboundFrame>,
    metrics: Arc<DispatchMetrics>,
) where
    C: NodeDirectory + HealthCheck + Send + Sync,
    U: FrameUploader + Send + Sync,
{
    debug!("dispatch worker started");

    while let Some(frame) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        metrics.inc_dequeued();
        metrics.set_in_flight(true);
        controller.dispatch(&frame).await;
        metrics.set_in_flight(false);
    }

    debug!("dispatch worker drained");
}
