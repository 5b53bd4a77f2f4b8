//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（线上记录字段、配置默认值）
//! - 基于本地 HTTP 后端的 e2e 测试（目录服务 + 节点）

#[cfg(test)]
mod contract_tests {
    use chrono::{TimeZone, Utc};
    use contracts::{Channel, Device, DeviceSnapshot, OutboundFrame, SessionId, StreamingConfig};
    use dispatcher::WireRecord;

    #[test]
    fn test_default_endpoints() {
        let config = StreamingConfig::default();
        assert_eq!(config.directory.available_node_path, "/api/available-node");
        assert_eq!(config.node.health_path, "/health");
        assert_eq!(config.node.upload_path, "/api/datarecovery/data");
        assert_eq!(config.dispatch.user_id, "user_app");
        assert!(config_loader::ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_wire_record_snapshot() {
        let watch = DeviceSnapshot::empty(Device::Watch)
            .with_connected(true)
            .with_value(Channel::WatchHeartRate, 72);
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let frame = OutboundFrame::new(SessionId::new(1), 1, timestamp, [watch]);

        let value = WireRecord::from_frame(&frame, "user_app").into_value();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 29);
        assert_eq!(value["session_id"], "1");
        assert_eq!(value["timeStamp"], "2024-03-01T10:30:00.000Z");
        assert_eq!(value["tic_hrppg"], "72");
        assert_eq!(value["e4_hr"], "");
        assert_eq!(value["ticwatchconnected"], true);
        assert_eq!(value["e4connected"], false);
        assert_eq!(value["ehealthboardconnected"], false);
        assert_eq!(value["user_id"], "user_app");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::{HashSet, VecDeque};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use chrono::Utc;
    use contracts::{
        Channel, ContractError, Device, DeviceSnapshot, DirectoryConfig, DispatchOutcome,
        DispatchState, LinkStatus, NodeConfig, OutboundFrame, SessionId, StoreConfig,
        StreamingConfig,
    };
    use dispatcher::{DispatchController, HttpUploader};
    use ingestion::{DeviceDriver, MockDriver, RepositorySet};
    use node_resolver::{HttpNodeClient, NodeResolver};
    use observability::LogFormat;
    use serde_json::{json, Value};
    use session::{open_store, SessionDeps, StreamingSession};

    /// 本地后端：目录服务与节点共用一个监听端口，节点按 Host 头区分
    #[derive(Default)]
    struct Backend {
        candidates: Mutex<VecDeque<String>>,
        fallback: Mutex<Option<String>>,
        healthy: Mutex<HashSet<String>>,
        upload_status: Mutex<u16>,
        directory_calls: Mutex<u32>,
        health_calls: Mutex<Vec<String>>,
        uploads: Mutex<Vec<Value>>,
    }

    impl Backend {
        fn new() -> Arc<Self> {
            let backend = Self::default();
            *backend.upload_status.lock().unwrap() = 200;
            Arc::new(backend)
        }

        fn push_candidate(&self, host: &str) {
            self.candidates.lock().unwrap().push_back(host.to_string());
        }

        fn set_fallback(&self, host: &str) {
            *self.fallback.lock().unwrap() = Some(host.to_string());
        }

        fn set_healthy(&self, host: &str) {
            self.healthy.lock().unwrap().insert(host.to_string());
        }

        fn set_upload_status(&self, status: u16) {
            *self.upload_status.lock().unwrap() = status;
        }

        fn directory_calls(&self) -> u32 {
            *self.directory_calls.lock().unwrap()
        }

        fn health_calls(&self) -> Vec<String> {
            self.health_calls.lock().unwrap().clone()
        }

        fn uploads(&self) -> Vec<Value> {
            self.uploads.lock().unwrap().clone()
        }
    }

    fn host_of(headers: &HeaderMap) -> String {
        headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(':').next())
            .unwrap_or_default()
            .to_string()
    }

    async fn available_node(State(backend): State<Arc<Backend>>) -> (StatusCode, Json<Value>) {
        *backend.directory_calls.lock().unwrap() += 1;
        let next = backend
            .candidates
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| backend.fallback.lock().unwrap().clone());
        match next {
            Some(ip) => (StatusCode::OK, Json(json!({ "ip": ip }))),
            None => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "no available node" })),
            ),
        }
    }

    async fn health(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> StatusCode {
        let host = host_of(&headers);
        backend.health_calls.lock().unwrap().push(host.clone());
        if backend.healthy.lock().unwrap().contains(&host) {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }

    async fn upload(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> StatusCode {
        backend.uploads.lock().unwrap().push(body);
        let status = *backend.upload_status.lock().unwrap();
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn init_logging() {
        // 多个测试共用一个全局 subscriber，重复初始化会返回错误
        let _ = observability::init_tracing(LogFormat::Compact, "warn");
    }

    async fn serve(backend: Arc<Backend>) -> SocketAddr {
        let app = Router::new()
            .route("/api/available-node", get(available_node))
            .route("/health", get(health))
            .route("/api/datarecovery/data", post(upload))
            .with_state(backend);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn config_for(addr: SocketAddr) -> StreamingConfig {
        let mut config = StreamingConfig {
            directory: DirectoryConfig {
                manager_base_url: format!("http://{addr}"),
                request_timeout_ms: 1000,
                ..Default::default()
            },
            node: NodeConfig {
                port: addr.port(),
                request_timeout_ms: 1000,
                ..Default::default()
            },
            ..Default::default()
        };
        config.sampler.interval_ms = 20;
        config
    }

    type HttpController = DispatchController<HttpNodeClient, HttpUploader>;

    fn http_controller(config: &StreamingConfig) -> HttpController {
        let client =
            HttpNodeClient::new(config.directory.clone(), config.node.clone()).unwrap();
        let uploader =
            HttpUploader::new(config.node.clone(), config.dispatch.user_id.clone()).unwrap();
        let resolver = NodeResolver::new(Arc::new(client), Arc::new(LinkStatus::new()));
        DispatchController::new(resolver, Arc::new(uploader))
    }

    fn heart_rate_frame(tick: u64) -> OutboundFrame {
        let watch = DeviceSnapshot::empty(Device::Watch)
            .with_connected(true)
            .with_value(Channel::WatchHeartRate, 72);
        OutboundFrame::new(SessionId::new(1), tick, Utc::now(), [watch])
    }

    /// 首帧：解析节点 → 上传成功；上传 500 → 失败，节点保留
    #[tokio::test]
    async fn test_e2e_deliver_then_reject() {
        init_logging();
        let backend = Backend::new();
        backend.set_fallback("127.0.0.1");
        backend.set_healthy("127.0.0.1");
        let addr = serve(backend.clone()).await;
        let controller = http_controller(&config_for(addr));

        let outcome = controller.dispatch(&heart_rate_frame(1)).await;
        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(controller.state(), DispatchState::NodeKnown);

        let uploads = backend.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0]["session_id"], "1");
        assert_eq!(uploads[0]["tic_hrppg"], "72");
        assert_eq!(uploads[0]["ticwatchconnected"], true);
        assert_eq!(uploads[0]["user_id"], "user_app");

        backend.set_upload_status(500);
        let outcome = controller.dispatch(&heart_rate_frame(2)).await;
        assert_eq!(outcome, DispatchOutcome::DeliveryFailed);
        assert_eq!(controller.state(), DispatchState::NodeSuspect);
        let link = controller.link().snapshot();
        assert_eq!(link.node.unwrap().host(), "127.0.0.1");
        assert!(link.last_dispatch_failed);

        // 节点健康复核后重新送达
        backend.set_upload_status(200);
        let checks_before = backend.health_calls().len();
        let outcome = controller.dispatch(&heart_rate_frame(3)).await;
        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(backend.health_calls().len(), checks_before + 1);
        assert_eq!(backend.directory_calls(), 1);
    }

    /// 首个候选不健康时再向目录服务请求一次
    #[tokio::test]
    async fn test_e2e_unhealthy_candidate_replaced() {
        let backend = Backend::new();
        backend.push_candidate("127.0.0.1");
        backend.push_candidate("localhost");
        backend.set_healthy("localhost");
        let addr = serve(backend.clone()).await;
        let controller = http_controller(&config_for(addr));

        let node = controller.resolve_now().await.unwrap();

        assert_eq!(node.host(), "localhost");
        assert_eq!(backend.directory_calls(), 2);
        assert_eq!(backend.health_calls(), vec!["127.0.0.1", "localhost"]);
        assert_eq!(controller.state(), DispatchState::NodeKnown);
    }

    /// 目录服务无可用节点：不上传，标记失败
    #[tokio::test]
    async fn test_e2e_no_available_node() {
        let backend = Backend::new();
        let addr = serve(backend.clone()).await;
        let controller = http_controller(&config_for(addr));

        let outcome = controller.dispatch(&heart_rate_frame(1)).await;

        assert_eq!(outcome, DispatchOutcome::NodeUnavailable);
        assert!(backend.uploads().is_empty());
        assert!(controller.link().last_dispatch_failed());
        assert_eq!(controller.state(), DispatchState::NoNode);
    }

    /// 完整会话：模拟驱动写入 → 采样 → HTTP 上传 → 会话记录落盘
    #[tokio::test]
    async fn test_e2e_session_over_http() {
        init_logging();
        let backend = Backend::new();
        backend.set_fallback("127.0.0.1");
        backend.set_healthy("127.0.0.1");
        let addr = serve(backend.clone()).await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(addr);
        config.store = StoreConfig {
            path: Some(dir.path().join("sessions.json")),
        };

        let repos = RepositorySet::new();
        repos.set_connected(Device::Watch, true);
        let driver = MockDriver::with_defaults(Device::Watch);
        driver.start(repos.callback_for(Device::Watch));

        let store = open_store(&config.store);
        let deps = SessionDeps::http(config.clone(), repos.clone(), store.clone()).unwrap();
        let session = StreamingSession::start(deps, "e2e").await.unwrap();
        assert_eq!(session.session_id(), SessionId::new(1));
        assert!(session.start_report().initial_node.is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = session.stop().await.unwrap();
        driver.stop();

        assert!(stats.worker_drained);
        assert!(stats.summary.delivered > 0);
        assert!(!stats.crashed());

        let uploads = backend.uploads();
        assert_eq!(uploads.len() as u64, stats.summary.delivered);
        assert!(uploads.iter().all(|u| u["session_id"] == "1"));
        assert!(uploads.iter().any(|u| u["tic_hrppg"] != ""));

        // 重新打开文件存储，记录已更新
        let reopened = open_store(&config.store);
        let record = reopened.get(SessionId::new(1)).unwrap().unwrap();
        assert_eq!(record.description, "e2e");
        assert!(record.watch_connected);
        assert!(!record.crashed);
        assert!(record.synced);
    }

    /// 会话期间节点拒收：最终记录 crashed
    #[tokio::test]
    async fn test_e2e_session_marks_crashed() {
        let backend = Backend::new();
        backend.set_fallback("127.0.0.1");
        backend.set_healthy("127.0.0.1");
        backend.set_upload_status(500);
        let addr = serve(backend.clone()).await;
        let config = config_for(addr);

        let repos = RepositorySet::new();
        repos.set_connected(Device::Board, true);
        let store = open_store(&config.store);
        let deps = SessionDeps::http(config, repos, store.clone()).unwrap();

        let session = StreamingSession::start(deps, "").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let stats = session.stop().await.unwrap();

        assert!(stats.crashed());
        assert!(stats.summary.delivery_failed > 0);
        let record = store.get(SessionId::new(1)).unwrap().unwrap();
        assert!(record.crashed);
    }

    #[tokio::test]
    async fn test_session_requires_device() {
        let config = StreamingConfig::default();
        let store = open_store(&config.store);
        let deps = SessionDeps::http(config, RepositorySet::new(), store).unwrap();

        let err = StreamingSession::start(deps, "").await.err().unwrap();
        assert!(matches!(err, session::SessionError::NoDeviceConnected));
    }

    #[test]
    fn test_store_error_surface() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, "not json").unwrap();

        let store = open_store(&StoreConfig { path: Some(path) });
        let err = store.list().unwrap_err();
        assert!(matches!(err, ContractError::Store { .. }));
    }
}
