//! Dispatcher error types

use contracts::{LinkError, NodeAddress};
use thiserror::Error;

/// Upload failure as seen by the HTTP uploader
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// Connection, timeout or body error
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Node answered with a non-success status
    #[error("upload rejected with status {status}")]
    Rejected { status: u16 },
}

impl DeliveryError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Map onto the shared link error taxonomy
    pub fn into_link_error(self, node: &NodeAddress) -> LinkError {
        match self {
            Self::Transport { message } => LinkError::delivery_transport(node, message),
            Self::Rejected { status } => LinkError::delivery_rejected(node, status),
        }
    }
}

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Hand-off queue full, frame skipped
    #[error("dispatch queue full, frame {tick} skipped")]
    QueueFull { tick: u64 },

    /// Worker already stopped
    #[error("dispatch worker closed, frame {tick} discarded")]
    WorkerClosed { tick: u64 },

    /// HTTP client could not be constructed
    #[error("failed to build http client: {message}")]
    ClientBuild { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_maps_to_link_error() {
        let node = NodeAddress::new("10.0.0.7").unwrap();

        let err = DeliveryError::transport("connection refused").into_link_error(&node);
        assert_eq!(err.kind(), "delivery_transport");

        let err = DeliveryError::Rejected { status: 503 }.into_link_error(&node);
        assert_eq!(err, LinkError::delivery_rejected(&node, 503));
    }
}
