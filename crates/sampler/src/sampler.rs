//! FrameSampler - 固定周期采样
//!
//! 每个 tick 复制三个仓库，组装 `OutboundFrame`，非阻塞地交给分发队列。
//! 采样任务从不等待网络。错过的 tick 顺延而不是补发。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use contracts::{OutboundFrame, SamplerConfig, SessionId};
use dispatcher::{DispatcherError, FrameSender};
use ingestion::RepositorySet;
use observability::metrics::record_tick;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace, warn};

use crate::metrics::{SamplerMetrics, SamplerMetricsSnapshot};

/// tokio interval 不接受零周期
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// 周期采样器
pub struct FrameSampler {
    repos: RepositorySet,
    sender: FrameSender,
    session_id: SessionId,
    interval: Duration,
}

impl FrameSampler {
    pub fn new(
        repos: RepositorySet,
        sender: FrameSender,
        session_id: SessionId,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            repos,
            sender,
            session_id,
            interval: config.interval().max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 复制仓库并组装一帧
    pub fn sample(&self, tick: u64) -> OutboundFrame {
        OutboundFrame::new(self.session_id, tick, Utc::now(), self.repos.snapshot_all())
    }

    /// 启动采样任务
    pub fn start(self) -> SamplerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let metrics = Arc::new(SamplerMetrics::new());
        let task_metrics = Arc::clone(&metrics);

        let task = tokio::spawn(async move {
            self.run(stop_rx, task_metrics).await;
        });

        SamplerHandle {
            stop_tx: Some(stop_tx),
            task,
            metrics,
        }
    }

    #[instrument(
        name = "frame_sampler_loop",
        skip_all,
        fields(session = %self.session_id, interval_ms = self.interval.as_millis() as u64)
    )]
    async fn run(self, mut stop_rx: oneshot::Receiver<()>, metrics: Arc<SamplerMetrics>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        info!("sampler started");

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = interval.tick() => {
                    let frame = self.sample(tick);
                    metrics.inc_ticks();
                    record_tick(tick, frame.present_count());
                    trace!(tick, present = frame.present_count(), "frame sampled");

                    match self.sender.try_send(frame) {
                        Ok(()) => metrics.inc_enqueued(),
                        Err(DispatcherError::QueueFull { .. }) => metrics.inc_skipped(),
                        Err(e) => {
                            if metrics.inc_discarded() {
                                warn!(error = %e, "dispatcher gone, frames are discarded until stop");
                            }
                        }
                    }
                    tick += 1;
                }
            }
        }

        debug!(ticks = tick, "sampler stopped");
    }
}

/// 运行中的采样任务
pub struct SamplerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    metrics: Arc<SamplerMetrics>,
}

impl SamplerHandle {
    pub fn metrics(&self) -> &Arc<SamplerMetrics> {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// 停止调度并等待任务退出
    ///
    /// 返回后不会再产生新的帧，采样器持有的 `FrameSender` 已释放。
    pub async fn stop(mut self) -> SamplerMetricsSnapshot {
        if let Some(tx) = self.stop_tx.take() {
            // 任务已自行退出时接收端不存在
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = ?e, "sampler task failed");
        }
        self.metrics.snapshot()
    }
}
