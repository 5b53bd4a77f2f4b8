//! Layered error definitions
//!
//! Categorized by source: config / address / store (`ContractError`) and the
//! recoverable network taxonomy of the streaming path (`LinkError`).

use thiserror::Error;

use crate::NodeAddress;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Node Errors =====
    /// Node address rejected
    #[error("invalid node address '{value}': {message}")]
    InvalidAddress { value: String, message: String },

    // ===== Store Errors =====
    /// Session record (de)serialization error
    #[error("session store error: {message}")]
    Store { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid address error
    pub fn invalid_address(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create session store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// Recoverable failure on the networked streaming path
///
/// None of these is fatal: the dispatch state machine absorbs them and the
/// next sampling tick is the retry unit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// Directory service unreachable or returned no address
    #[error("directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },

    /// Candidate node failed its health check
    #[error("node {node} unhealthy: {reason}")]
    NodeUnhealthy { node: NodeAddress, reason: String },

    /// Network failure during upload
    #[error("transport error delivering to {node}: {message}")]
    DeliveryTransport { node: NodeAddress, message: String },

    /// Node answered the upload with a non-success status
    #[error("node {node} rejected frame with status {status}")]
    DeliveryRejected { node: NodeAddress, status: u16 },
}

impl LinkError {
    pub fn directory_unavailable(reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            reason: reason.into(),
        }
    }

    pub fn node_unhealthy(node: &NodeAddress, reason: impl Into<String>) -> Self {
        Self::NodeUnhealthy {
            node: node.clone(),
            reason: reason.into(),
        }
    }

    pub fn delivery_transport(node: &NodeAddress, message: impl Into<String>) -> Self {
        Self::DeliveryTransport {
            node: node.clone(),
            message: message.into(),
        }
    }

    pub fn delivery_rejected(node: &NodeAddress, status: u16) -> Self {
        Self::DeliveryRejected {
            node: node.clone(),
            status,
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable { .. } => "directory_unavailable",
            Self::NodeUnhealthy { .. } => "node_unhealthy",
            Self::DeliveryTransport { .. } => "delivery_transport",
            Self::DeliveryRejected { .. } => "delivery_rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_error_display_and_kind() {
        let node = NodeAddress::new("10.0.0.7").unwrap();
        let err = LinkError::delivery_rejected(&node, 500);
        assert_eq!(err.kind(), "delivery_rejected");
        assert!(err.to_string().contains("10.0.0.7"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = ContractError::config_validation("sampler.interval_ms", "must be > 0");
        assert_eq!(
            err.to_string(),
            "config validation error at 'sampler.interval_ms': must be > 0"
        );
    }
}
