//! NodeResolver - 节点解析与健康复核
//!
//! 解析策略：
//! 1. 向目录服务索取一个候选节点
//! 2. 对候选节点做健康检查
//! 3. 健康则写入 LinkStatus 并返回
//! 4. 不健康则再向目录索取一次（共两次，无退避）
//!
//! 目录服务本身失败时立即放弃。最终失败会清除当前节点。

use std::sync::Arc;

use contracts::{HealthCheck, LinkError, LinkStatus, NodeAddress, NodeDirectory};
use observability::metrics::{record_link_error, record_resolution, record_validation};
use tracing::{info, instrument, warn};

use crate::error::{ResolveError, Result};

/// 每次解析最多尝试的候选节点数
pub const MAX_CANDIDATE_ATTEMPTS: u8 = 2;

/// 节点解析器
///
/// 持有客户端和会话的 LinkStatus。调用方负责串行化
/// `resolve` / `validate`，解析器本身不加锁。
pub struct NodeResolver<C> {
    client: Arc<C>,
    link: Arc<LinkStatus>,
}

impl<C> Clone for NodeResolver<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            link: self.link.clone(),
        }
    }
}

impl<C> NodeResolver<C>
where
    C: NodeDirectory + HealthCheck + Send + Sync,
{
    pub fn new(client: Arc<C>, link: Arc<LinkStatus>) -> Self {
        Self { client, link }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn link(&self) -> &Arc<LinkStatus> {
        &self.link
    }

    /// 解析一个健康节点并设为当前节点
    ///
    /// # Errors
    /// `ResolveError::Unavailable`：目录失败，或两个候选都不健康。
    /// 此时当前节点被清除。
    #[instrument(name = "node_resolve", skip(self))]
    pub async fn resolve(&self) -> Result<NodeAddress> {
        let mut attempts: u8 = 0;

        let last = loop {
            attempts += 1;

            let candidate = match self.client.fetch_candidate().await {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "directory unavailable");
                    break e;
                }
            };

            match self.client.check_health(&candidate).await {
                Ok(()) => {
                    self.link.set_node(candidate.clone());
                    record_resolution(true, attempts);
                    info!(node = %candidate, attempts, "node resolved");
                    return Ok(candidate);
                }
                Err(e) => {
                    warn!(attempt = attempts, node = %candidate, error = %e, "candidate unhealthy");
                    record_link_error(&e);
                    if attempts >= MAX_CANDIDATE_ATTEMPTS {
                        break e;
                    }
                }
            }
        };

        self.fail(attempts, last)
    }

    fn fail(&self, attempts: u8, last: LinkError) -> Result<NodeAddress> {
        self.link.clear_node();
        record_resolution(false, attempts);
        if matches!(last, LinkError::DirectoryUnavailable { .. }) {
            record_link_error(&last);
        }
        tracing::error!(attempts, error = %last, "no healthy node available");
        Err(ResolveError::unavailable(attempts, last))
    }

    /// 仅对给定节点重新做健康检查
    #[instrument(name = "node_validate", skip(self), fields(node = %node))]
    pub async fn validate(&self, node: &NodeAddress) -> bool {
        let healthy = match self.client.check_health(node).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "node failed validation");
                record_link_error(&e);
                false
            }
        };
        record_validation(healthy);
        healthy
    }
}
