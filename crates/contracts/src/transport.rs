//! Network seams of the streaming path
//!
//! Directory lookup, health probing and frame upload are traits so the
//! resolver and the dispatch controller run unchanged against HTTP clients
//! and scripted mocks.

use crate::{LinkError, NodeAddress, OutboundFrame};

/// Directory service client
#[trait_variant::make(NodeDirectory: Send)]
pub trait LocalNodeDirectory {
    /// Ask the directory for one node believed to be available
    ///
    /// # Errors
    /// `LinkError::DirectoryUnavailable` on network error, non-success status
    /// or an empty body.
    async fn fetch_candidate(&self) -> Result<NodeAddress, LinkError>;
}

/// Node liveness check
#[trait_variant::make(HealthCheck: Send)]
pub trait LocalHealthCheck {
    /// Check the node's health endpoint
    ///
    /// # Errors
    /// `LinkError::NodeUnhealthy` on transport error or non-2xx status.
    async fn check_health(&self, node: &NodeAddress) -> Result<(), LinkError>;
}

/// Frame upload
#[trait_variant::make(FrameUploader: Send)]
pub trait LocalFrameUploader {
    /// Perform exactly one network write of `frame` to `node`
    ///
    /// # Errors
    /// `LinkError::DeliveryRejected` or `LinkError::DeliveryTransport`.
    async fn upload(&self, frame: &OutboundFrame, node: &NodeAddress) -> Result<(), LinkError>;
}
