//! HTTP 节点客户端
//!
//! 目录服务：`GET <manager>/api/available-node` → `{"ip": "<host>"}`。
//! 健康检查：`GET http://<host>:<port>/health`，2xx 视为健康。

use contracts::{
    DirectoryConfig, HealthCheck, LinkError, NodeAddress, NodeConfig, NodeDirectory,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{ResolveError, Result};

/// 目录服务响应体
#[derive(Debug, Deserialize)]
struct AvailableNodeResponse {
    #[serde(default)]
    ip: Option<String>,
}

/// 基于 reqwest 的目录与健康检查客户端
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    client: reqwest::Client,
    directory: DirectoryConfig,
    node: NodeConfig,
}

impl HttpNodeClient {
    /// 创建客户端
    ///
    /// 超时按请求设置：目录请求使用 `directory.request_timeout_ms`，
    /// 健康检查使用 `node.request_timeout_ms`。
    pub fn new(directory: DirectoryConfig, node: NodeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ResolveError::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, directory, node))
    }

    /// 复用已有的 reqwest 客户端
    pub fn with_client(client: reqwest::Client, directory: DirectoryConfig, node: NodeConfig) -> Self {
        Self {
            client,
            directory,
            node,
        }
    }

    pub fn directory_config(&self) -> &DirectoryConfig {
        &self.directory
    }

    pub fn node_config(&self) -> &NodeConfig {
        &self.node
    }
}

impl NodeDirectory for HttpNodeClient {
    #[instrument(name = "directory_fetch_candidate", skip(self), fields(url))]
    async fn fetch_candidate(&self) -> std::result::Result<NodeAddress, LinkError> {
        let url = self.directory.available_node_url();
        tracing::Span::current().record("url", url.as_str());

        let response = self
            .client
            .get(&url)
            .timeout(self.directory.request_timeout())
            .send()
            .await
            .map_err(|e| LinkError::directory_unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkError::directory_unavailable(format!(
                "directory answered {status}"
            )));
        }

        let body: AvailableNodeResponse = response
            .json()
            .await
            .map_err(|e| LinkError::directory_unavailable(format!("malformed body: {e}")))?;

        let ip = body
            .ip
            .filter(|ip| !ip.trim().is_empty())
            .ok_or_else(|| LinkError::directory_unavailable("response carried no ip"))?;

        let node = NodeAddress::new(&ip)
            .map_err(|e| LinkError::directory_unavailable(e.to_string()))?;

        debug!(node = %node, "directory returned candidate");
        Ok(node)
    }
}

impl HealthCheck for HttpNodeClient {
    #[instrument(name = "node_health_check", skip(self), fields(node = %node))]
    async fn check_health(&self, node: &NodeAddress) -> std::result::Result<(), LinkError> {
        let url = self.node.health_url(node);

        let response = self
            .client
            .get(&url)
            .timeout(self.node.request_timeout())
            .send()
            .await
            .map_err(|e| LinkError::node_unhealthy(node, format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "node healthy");
            Ok(())
        } else {
            Err(LinkError::node_unhealthy(node, format!("health answered {status}")))
        }
    }
}
