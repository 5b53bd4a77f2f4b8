//! Mock uploader
//!
//! Scripted upload results with call recording, for controller and
//! session tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{FrameUploader, LinkError, NodeAddress, OutboundFrame};

/// One recorded upload
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub node: NodeAddress,
    pub frame: OutboundFrame,
}

/// Mock uploader
///
/// Scripted results are consumed first; afterwards uploads succeed unless
/// the node is marked as rejecting (status 500).
#[derive(Debug, Default)]
pub struct MockUploader {
    script: Mutex<VecDeque<Result<(), u16>>>,
    rejecting: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    calls: AtomicU32,
    uploads: Mutex<Vec<RecordedUpload>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait before answering each upload
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a success (`Ok`) or a rejection with the given status
    pub fn push_result(&self, result: Result<(), u16>) {
        lock(&self.script).push_back(result);
    }

    pub fn set_rejecting(&self, host: &str, rejecting: bool) {
        let mut set = lock(&self.rejecting);
        if rejecting {
            set.insert(host.to_string());
        } else {
            set.remove(host);
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Frames accepted so far
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        lock(&self.uploads).clone()
    }
}

impl FrameUploader for MockUploader {
    async fn upload(&self, frame: &OutboundFrame, node: &NodeAddress) -> Result<(), LinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = lock(&self.script).pop_front();
        let result = match scripted {
            Some(result) => result,
            None if lock(&self.rejecting).contains(node.host()) => Err(500),
            None => Ok(()),
        };

        match result {
            Ok(()) => {
                lock(&self.uploads).push(RecordedUpload {
                    node: node.clone(),
                    frame: frame.clone(),
                });
                Ok(())
            }
            Err(status) => Err(LinkError::delivery_rejected(node, status)),
        }
    }
}
