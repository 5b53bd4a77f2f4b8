//! HttpUploader - POST one frame to the current node

use contracts::{FrameUploader, LinkError, NodeAddress, NodeConfig, OutboundFrame};
use tracing::{debug, instrument};

use crate::error::{DeliveryError, DispatcherError};
use crate::wire::WireRecord;

/// Uploads frames as flat JSON records
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    node: NodeConfig,
    user_id: String,
}

impl HttpUploader {
    pub fn new(node: NodeConfig, user_id: impl Into<String>) -> Result<Self, DispatcherError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DispatcherError::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, node, user_id))
    }

    pub fn with_client(client: reqwest::Client, node: NodeConfig, user_id: impl Into<String>) -> Self {
        Self {
            client,
            node,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Single POST, no retry
    #[instrument(
        name = "http_upload",
        skip(self, frame),
        fields(node = %node, tick = frame.tick())
    )]
    pub async fn send(&self, frame: &OutboundFrame, node: &NodeAddress) -> Result<(), DeliveryError> {
        let url = self.node.upload_url(node);
        let record = WireRecord::from_frame(frame, &self.user_id);

        let response = self
            .client
            .post(&url)
            .timeout(self.node.request_timeout())
            .json(&record)
            .send()
            .await
            .map_err(|e| DeliveryError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(%status, "frame uploaded");
        Ok(())
    }
}

impl FrameUploader for HttpUploader {
    async fn upload(&self, frame: &OutboundFrame, node: &NodeAddress) -> Result<(), LinkError> {
        self.send(frame, node)
            .await
            .map_err(|e| e.into_link_error(node))
    }
}
