//! StreamingConfig - Config Loader output
//!
//! Directory, node endpoints, sampling cadence, dispatch and store settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::NodeAddress;

/// Complete streaming configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Directory service settings
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Ingestion node endpoints
    #[serde(default)]
    pub node: NodeConfig,

    /// Sampling cadence
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Dispatch worker settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Local session store
    #[serde(default)]
    pub store: StoreConfig,
}

/// Directory service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Manager base URL, e.g. `http://192.168.1.141:30001`
    #[serde(default = "default_manager_base_url")]
    pub manager_base_url: String,

    /// Path of the available-node endpoint
    #[serde(default = "default_available_node_path")]
    pub available_node_path: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl DirectoryConfig {
    /// Full URL of the available-node endpoint
    pub fn available_node_url(&self) -> String {
        format!(
            "{}{}",
            self.manager_base_url.trim_end_matches('/'),
            self.available_node_path
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            manager_base_url: default_manager_base_url(),
            available_node_path: default_available_node_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Ingestion node endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Fixed port every node listens on
    #[serde(default = "default_node_port")]
    pub port: u16,

    /// Health check path
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Data upload path
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Per-request timeout (health check and upload)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl NodeConfig {
    pub fn health_url(&self, node: &NodeAddress) -> String {
        node.url(self.port, &self.health_path)
    }

    pub fn upload_url(&self, node: &NodeAddress) -> String {
        node.url(self.port, &self.upload_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: default_node_port(),
            health_path: default_health_path(),
            upload_path: default_upload_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Minimum milliseconds between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

/// Dispatch worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Frames allowed to wait behind the in-flight dispatch
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// User identifier sent with every frame
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// How long `stop` waits for an in-flight dispatch before aborting it
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl DispatchConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            user_id: default_user_id(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

/// Local session store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding session records (None = in-memory)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_manager_base_url() -> String {
    "http://127.0.0.1:30001".to_string()
}

fn default_available_node_path() -> String {
    "/api/available-node".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_node_port() -> u16 {
    30080
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_upload_path() -> String {
    "/api/datarecovery/data".to_string()
}

fn default_interval_ms() -> u64 {
    200
}

fn default_queue_capacity() -> usize {
    1
}

fn default_user_id() -> String {
    "user_app".to_string()
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}
