//! StreamingSession - 会话生命周期
//!
//! start：检查设备 → 分配会话 ID → 清空仓库 → 写入记录 → 初始解析
//! → 启动分发 worker 与采样器。
//! stop：停止采样 → 等待分发收尾 → 更新记录。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use contracts::{
    Device, DispatchState, FrameUploader, HealthCheck, LinkSnapshot, LinkStatus, NodeAddress,
    NodeDirectory, SessionId, SessionRecord, StreamingConfig,
};
use dispatcher::{DispatchController, DispatchHandle, DispatchMetricsSnapshot, HttpUploader};
use ingestion::{RepositoryLease, RepositorySet};
use node_resolver::{HttpNodeClient, NodeResolver};
use observability::DispatchSummary;
use sampler::{FrameSampler, SamplerHandle, SamplerMetricsSnapshot};
use tracing::{error, info, instrument, warn};

use crate::error::{Result, SessionError};
use crate::stats::SessionStats;
use crate::store::{next_session_id, SessionStore};
use crate::time::total_secs;

/// 会话依赖
pub struct SessionDeps<C, U> {
    pub config: StreamingConfig,
    pub repos: RepositorySet,
    pub store: Arc<dyn SessionStore>,
    pub client: Arc<C>,
    pub uploader: Arc<U>,
}

impl<C, U> Clone for SessionDeps<C, U> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            repos: self.repos.clone(),
            store: self.store.clone(),
            client: self.client.clone(),
            uploader: self.uploader.clone(),
        }
    }
}

impl SessionDeps<HttpNodeClient, HttpUploader> {
    /// 使用 HTTP 客户端构建依赖
    pub fn http(
        config: StreamingConfig,
        repos: RepositorySet,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let client = HttpNodeClient::new(config.directory.clone(), config.node.clone())?;
        let uploader = HttpUploader::new(config.node.clone(), config.dispatch.user_id.clone())?;
        Ok(Self {
            config,
            repos,
            store,
            client: Arc::new(client),
            uploader: Arc::new(uploader),
        })
    }
}

/// 会话启动报告
#[derive(Debug, Clone)]
pub struct StartReport {
    pub session_id: SessionId,
    /// 初始解析得到的节点
    pub initial_node: Option<NodeAddress>,
    /// 初始解析失败原因
    pub initial_error: Option<String>,
    pub connected: Vec<Device>,
}

/// 会话状态（供状态指示使用）
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub link: LinkSnapshot,
    pub state: DispatchState,
    pub sampler: SamplerMetricsSnapshot,
    /// 分发 worker 已退出，帧不再送出
    pub dispatch_lost: bool,
    pub dispatch: DispatchMetricsSnapshot,
    pub summary: DispatchSummary,
}

/// 运行中的流式会话
pub struct StreamingSession<C, U> {
    record: SessionRecord,
    report: StartReport,
    controller: Arc<DispatchController<C, U>>,
    dispatch: DispatchHandle,
    sampler: SamplerHandle,
    store: Arc<dyn SessionStore>,
    grace: Duration,
    lease: RepositoryLease,
}

impl<C, U> StreamingSession<C, U>
where
    C: NodeDirectory + HealthCheck + Send + Sync + 'static,
    U: FrameUploader + Send + Sync + 'static,
{
    /// 启动会话
    ///
    /// # Errors
    /// - 没有已连接设备
    /// - 同一组仓库上已有会话在采样
    /// - 会话记录写入失败
    ///
    /// 初始解析失败不会中止会话，由首个 tick 重新解析。
    #[instrument(name = "session_start", skip_all)]
    pub async fn start(deps: SessionDeps<C, U>, description: impl Into<String>) -> Result<Self> {
        let SessionDeps {
            config,
            repos,
            store,
            client,
            uploader,
        } = deps;

        let connected = repos.connected_devices();
        if connected.is_empty() {
            return Err(SessionError::NoDeviceConnected);
        }
        // 租约随会话存活，start 中途失败时自动释放
        let lease = repos.try_lease().ok_or(SessionError::SessionActive)?;

        let session_id = next_session_id(store.as_ref())?;
        repos.reset_all();

        let now = Utc::now();
        let record = SessionRecord {
            session_id,
            user_id: config.dispatch.user_id.clone(),
            started_at: now,
            finished_at: now,
            duration_secs: 0,
            band_connected: connected.contains(&Device::Band),
            watch_connected: connected.contains(&Device::Watch),
            board_connected: connected.contains(&Device::Board),
            description: description.into(),
            synced: true,
            crashed: false,
        };
        store.insert(&record)?;

        let link = Arc::new(LinkStatus::new());
        let resolver = NodeResolver::new(client, link);
        let controller = Arc::new(DispatchController::new(resolver, uploader));

        let (initial_node, initial_error) = match controller.resolve_now().await {
            Ok(node) => (Some(node), None),
            Err(e) => {
                warn!(%session_id, error = %e, "initial resolution failed, first tick will retry");
                (None, Some(e.to_string()))
            }
        };

        let dispatch = DispatchHandle::spawn(controller.clone(), config.dispatch.queue_capacity);
        let sampler =
            FrameSampler::new(repos, dispatch.sender(), session_id, &config.sampler).start();

        info!(
            %session_id,
            devices = ?connected,
            node = ?initial_node.as_ref().map(NodeAddress::host),
            "session started"
        );

        Ok(Self {
            record,
            report: StartReport {
                session_id,
                initial_node,
                initial_error,
                connected,
            },
            controller,
            dispatch,
            sampler,
            store,
            grace: config.dispatch.shutdown_grace(),
            lease,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.record.session_id
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn start_report(&self) -> &StartReport {
        &self.report
    }

    pub fn controller(&self) -> &Arc<DispatchController<C, U>> {
        &self.controller
    }

    pub fn status(&self) -> SessionStatus {
        let link = self.controller.link().snapshot();
        let sampler = self.sampler.metrics();
        SessionStatus {
            session_id: self.record.session_id,
            state: link.state(),
            link,
            sampler: sampler.snapshot(),
            dispatch_lost: sampler.dispatch_lost(),
            dispatch: self.dispatch.metrics().snapshot(),
            summary: self.controller.summary(),
        }
    }

    /// 停止会话
    ///
    /// 采样先停，进行中的上传允许完成（受 `shutdown_grace_ms` 限制）。
    /// 记录中的 crashed 取最后一次分发是否失败。
    #[instrument(name = "session_stop", skip_all, fields(session = %self.record.session_id))]
    pub async fn stop(self) -> Result<SessionStats> {
        let Self {
            mut record,
            controller,
            dispatch,
            sampler,
            store,
            grace,
            lease,
            ..
        } = self;

        let sampler_stats: SamplerMetricsSnapshot = sampler.stop().await;
        drop(lease);
        let dispatch_metrics = dispatch.metrics().clone();
        let worker_drained = dispatch.shutdown(grace).await;

        let link = controller.link().snapshot();
        let finished_at = Utc::now();
        record.finished_at = finished_at;
        record.duration_secs = total_secs(record.started_at, finished_at);
        record.crashed = link.last_dispatch_failed;

        if let Err(e) = store.update(&record) {
            error!(error = %e, "failed to update session record");
            return Err(e.into());
        }

        info!(
            duration_secs = record.duration_secs,
            ticks = sampler_stats.ticks,
            crashed = record.crashed,
            "session stopped"
        );

        Ok(SessionStats {
            record,
            link,
            sampler: sampler_stats,
            dispatch: dispatch_metrics.snapshot(),
            summary: controller.summary(),
            worker_drained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use contracts::{Channel, SamplerConfig, SensorValue};
    use dispatcher::MockUploader;
    use node_resolver::MockNodeClient;

    fn deps(client: MockNodeClient, uploader: MockUploader) -> SessionDeps<MockNodeClient, MockUploader> {
        let config = StreamingConfig {
            sampler: SamplerConfig { interval_ms: 10 },
            ..Default::default()
        };
        SessionDeps {
            config,
            repos: RepositorySet::new(),
            store: Arc::new(InMemorySessionStore::new()),
            client: Arc::new(client),
            uploader: Arc::new(uploader),
        }
    }

    fn healthy() -> MockNodeClient {
        MockNodeClient::new()
            .with_fallback("10.0.0.1")
            .with_healthy(["10.0.0.1"])
    }

    #[tokio::test]
    async fn test_start_requires_connected_device() {
        let deps = deps(healthy(), MockUploader::new());
        let result = StreamingSession::start(deps, "").await;
        assert!(matches!(result, Err(SessionError::NoDeviceConnected)));
    }

    #[tokio::test]
    async fn test_session_ids_increment() {
        let deps = deps(healthy(), MockUploader::new());
        deps.repos.set_connected(Device::Watch, true);

        let first = StreamingSession::start(deps.clone(), "first").await.unwrap();
        assert_eq!(first.session_id(), SessionId::new(1));
        first.stop().await.unwrap();

        let second = StreamingSession::start(deps.clone(), "second").await.unwrap();
        assert_eq!(second.session_id(), SessionId::new(2));
        second.stop().await.unwrap();

        assert_eq!(deps.store.list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_streaming() {
        let deps = deps(healthy(), MockUploader::new());
        deps.repos.set_connected(Device::Watch, true);

        let first = StreamingSession::start(deps.clone(), "first").await.unwrap();
        deps.repos.write(Channel::WatchHeartRate, 72).unwrap();

        let second = StreamingSession::start(deps.clone(), "second").await;
        assert!(matches!(second, Err(SessionError::SessionActive)));
        assert_eq!(deps.repos.get(Channel::WatchHeartRate), Some(SensorValue::Int(72)));
        assert_eq!(deps.store.list().unwrap().len(), 1);
        assert_eq!(first.status().state, DispatchState::NodeKnown);
        assert!(!first.status().dispatch_lost);

        first.stop().await.unwrap();
        assert!(!deps.repos.is_leased());

        let second = StreamingSession::start(deps.clone(), "second").await.unwrap();
        assert_eq!(second.session_id(), SessionId::new(2));
        second.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_reports_sampler_and_outcomes() {
        let deps = deps(healthy(), MockUploader::new());
        deps.repos.set_connected(Device::Watch, true);

        let session = StreamingSession::start(deps, "").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let status = session.status();
        assert!(status.sampler.ticks > 0);
        assert_eq!(status.sampler.discarded, 0);
        assert!(!status.dispatch_lost);
        assert!(status.summary.delivered > 0);

        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_start_releases_lease() {
        let deps = deps(healthy(), MockUploader::new());
        let result = StreamingSession::start(deps.clone(), "").await;
        assert!(matches!(result, Err(SessionError::NoDeviceConnected)));
        assert!(!deps.repos.is_leased());
    }

    #[tokio::test]
    async fn test_start_resets_repositories_and_resolves() {
        let deps = deps(healthy(), MockUploader::new());
        deps.repos.set_connected(Device::Board, true);
        deps.repos.write(Channel::BoardBpm, 120).unwrap();

        let session = StreamingSession::start(deps.clone(), "").await.unwrap();

        assert_eq!(deps.repos.get(Channel::BoardBpm), None);
        assert!(deps.repos.repository(Device::Board).is_connected());
        assert_eq!(
            session.start_report().initial_node.as_ref().map(NodeAddress::host),
            Some("10.0.0.1")
        );
        assert_eq!(session.status().state, DispatchState::NodeKnown);
        assert!(session.record().board_connected);
        assert!(!session.record().watch_connected);

        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_initial_resolution_failure_is_not_fatal() {
        let deps = deps(MockNodeClient::new(), MockUploader::new());
        deps.repos.set_connected(Device::Band, true);

        let session = StreamingSession::start(deps, "").await.unwrap();
        assert!(session.start_report().initial_node.is_none());
        assert!(session.start_report().initial_error.is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stats = session.stop().await.unwrap();

        assert_eq!(stats.summary.delivered, 0);
        assert!(stats.summary.node_unavailable > 0);
        assert!(stats.crashed());
    }

    #[tokio::test]
    async fn test_stop_updates_record() {
        let deps = deps(healthy(), MockUploader::new());
        deps.repos.set_connected(Device::Watch, true);

        let session = StreamingSession::start(deps.clone(), "walk").await.unwrap();
        deps.repos.write(Channel::WatchHeartRate, 72).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let stats = session.stop().await.unwrap();

        assert!(stats.worker_drained);
        assert!(stats.sampler.ticks > 0);
        assert!(stats.summary.delivered > 0);
        assert!(!stats.crashed());

        let stored = deps.store.get(SessionId::new(1)).unwrap().unwrap();
        assert_eq!(stored.description, "walk");
        assert!(stored.finished_at >= stored.started_at);
        assert!(!stored.crashed);
    }

    #[tokio::test]
    async fn test_stop_with_upload_in_flight() {
        let deps = deps(healthy(), MockUploader::new().with_delay(Duration::from_millis(150)));
        deps.repos.set_connected(Device::Watch, true);

        let session = StreamingSession::start(deps.clone(), "").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let stats = session.stop().await.unwrap();

        assert!(stats.worker_drained);
        assert_eq!(stats.summary.delivered, stats.dispatch.enqueued);
        assert_eq!(stats.summary.total_dispatches, stats.dispatch.dequeued);
        assert!(!stats.record.crashed);
    }
}
