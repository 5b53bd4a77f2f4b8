//! NodeAddress - ingestion node host
//!
//! Host only (IP or hostname), the port and relative paths come from `NodeConfig`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ContractError;

/// Address of an ingestion node, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeAddress(Arc<str>);

impl NodeAddress {
    /// Parse a host returned by the directory service
    ///
    /// # Errors
    /// Empty hosts, hosts with whitespace, a scheme or a path are rejected.
    pub fn new(host: &str) -> Result<Self, ContractError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ContractError::invalid_address(host, "empty host"));
        }
        if host.contains("://") || host.contains('/') {
            return Err(ContractError::invalid_address(
                host,
                "expected a bare host without scheme or path",
            ));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(ContractError::invalid_address(host, "host contains whitespace"));
        }
        Ok(Self(Arc::from(host)))
    }

    /// Host string
    pub fn host(&self) -> &str {
        &self.0
    }

    /// Build `http://<host>:<port><path>`
    pub fn url(&self, port: u16, path: &str) -> String {
        format!("http://{}:{}{}", self.0, port, path)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeAddress {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<NodeAddress> for String {
    fn from(value: NodeAddress) -> Self {
        value.0.to_string()
    }
}
