//! Mock 节点客户端
//!
//! 按脚本返回候选节点与健康状态，并记录调用次数，用于单元测试。

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{HealthCheck, LinkError, NodeAddress, NodeDirectory};
use tracing::instrument;

/// 脚本中的一次目录应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryAnswer {
    /// 返回该主机
    Candidate(String),
    /// 目录服务不可用
    Failure,
}

/// Mock 节点客户端
///
/// 目录应答按脚本顺序消费，脚本耗尽后使用 fallback（未设置时目录失败）。
/// 只有登记为健康的主机能通过健康检查。
#[derive(Debug, Default)]
pub struct MockNodeClient {
    script: Mutex<VecDeque<DirectoryAnswer>>,
    fallback: Option<String>,
    healthy: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    directory_calls: AtomicU32,
    health_checks: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回给定主机
    pub fn with_candidates<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(hosts.into_iter().map(|h| DirectoryAnswer::Candidate(h.into())));
        self
    }

    /// 脚本耗尽后总是返回该主机
    pub fn with_fallback(mut self, host: impl Into<String>) -> Self {
        self.fallback = Some(host.into());
        self
    }

    /// 登记健康主机
    pub fn with_healthy<I, S>(self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.healthy).extend(hosts.into_iter().map(Into::into));
        self
    }

    /// 每次网络调用前等待
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_answer(&self, answer: DirectoryAnswer) {
        lock(&self.script).push_back(answer);
    }

    pub fn set_healthy(&self, host: &str, healthy: bool) {
        let mut set = lock(&self.healthy);
        if healthy {
            set.insert(host.to_string());
        } else {
            set.remove(host);
        }
    }

    pub fn directory_calls(&self) -> u32 {
        self.directory_calls.load(Ordering::SeqCst)
    }

    pub fn health_checks(&self) -> u32 {
        self.health_checks.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.directory_calls.store(0, Ordering::SeqCst);
        self.health_checks.store(0, Ordering::SeqCst);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl NodeDirectory for MockNodeClient {
    #[instrument(name = "mock_directory_fetch", skip(self))]
    async fn fetch_candidate(&self) -> Result<NodeAddress, LinkError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let answer = lock(&self.script).pop_front();
        let host = match answer {
            Some(DirectoryAnswer::Candidate(host)) => host,
            Some(DirectoryAnswer::Failure) => {
                return Err(LinkError::directory_unavailable("mock directory failure"));
            }
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LinkError::directory_unavailable("mock script exhausted"))?,
        };

        NodeAddress::new(&host).map_err(|e| LinkError::directory_unavailable(e.to_string()))
    }
}

impl HealthCheck for MockNodeClient {
    #[instrument(name = "mock_health_check", skip(self), fields(node = %node))]
    async fn check_health(&self, node: &NodeAddress) -> Result<(), LinkError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if lock(&self.healthy).contains(node.host()) {
            Ok(())
        } else {
            Err(LinkError::node_unhealthy(node, "mock node unhealthy"))
        }
    }
}
