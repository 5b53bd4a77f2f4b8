//! 分发指标收集模块
//!
//! 记录采样 tick、节点解析、健康检查与分发结果，并在内存中聚合会话统计。

use std::collections::HashMap;

use contracts::{DispatchOutcome, LinkError};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// 注册指标说明（导出器安装后调用一次）
pub fn describe() {
    describe_counter!("telemetry_ticks_total", "Sampler ticks since start");
    describe_gauge!("telemetry_last_tick", "Sequence number of the latest tick");
    describe_gauge!(
        "telemetry_frame_present_channels",
        "Channels with a value in the latest frame"
    );
    describe_counter!(
        "telemetry_frames_skipped_total",
        "Frames dropped because a dispatch was still in progress"
    );
    describe_counter!("telemetry_dispatch_total", "Dispatch outcomes by kind");
    describe_gauge!(
        "telemetry_last_dispatch_failed",
        "1 when the most recent dispatch did not deliver"
    );
    describe_counter!("telemetry_link_errors_total", "Network failures by kind");
    describe_counter!("telemetry_resolve_total", "Node resolutions by status");
    describe_histogram!(
        "telemetry_resolve_attempts",
        "Directory candidates tried per resolution"
    );
    describe_counter!("telemetry_validate_total", "Health re-checks of the cached node");
    describe_histogram!(
        "telemetry_delivery_latency_ms",
        Unit::Milliseconds,
        "Upload round-trip time"
    );
    describe_counter!("telemetry_readings_total", "Sensor readings written by device");
}

/// 记录一次采样 tick
///
/// `present_channels` 为本帧中有值的通道数。
pub fn record_tick(tick: u64, present_channels: usize) {
    counter!("telemetry_ticks_total").increment(1);
    gauge!("telemetry_last_tick").set(tick as f64);
    gauge!("telemetry_frame_present_channels").set(present_channels as f64);
}

/// 记录因分发队列已满而跳过的帧
pub fn record_frame_skipped() {
    counter!("telemetry_frames_skipped_total").increment(1);
}

/// 记录分发结果
pub fn record_dispatch_outcome(outcome: DispatchOutcome) {
    counter!(
        "telemetry_dispatch_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);

    let failed = if outcome.is_delivered() { 0.0 } else { 1.0 };
    gauge!("telemetry_last_dispatch_failed").set(failed);
}

/// 记录网络错误类别
pub fn record_link_error(error: &LinkError) {
    counter!(
        "telemetry_link_errors_total",
        "kind" => error.kind()
    )
    .increment(1);
}

/// 记录节点解析结果
pub fn record_resolution(success: bool, attempts: u8) {
    let status = if success { "success" } else { "failure" };
    counter!("telemetry_resolve_total", "status" => status).increment(1);
    histogram!("telemetry_resolve_attempts").record(attempts as f64);
}

/// 记录已知节点的健康复核
pub fn record_validation(healthy: bool) {
    let status = if healthy { "healthy" } else { "unhealthy" };
    counter!("telemetry_validate_total", "status" => status).increment(1);
}

/// 记录上传耗时
pub fn record_delivery_latency_ms(latency_ms: f64) {
    histogram!("telemetry_delivery_latency_ms").record(latency_ms);
}

/// 分发指标聚合器
///
/// 在内存中聚合一次会话的分发结果，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchAggregator {
    /// 分发次数
    pub total_dispatches: u64,

    /// 成功送达
    pub delivered: u64,

    /// 无可用节点
    pub node_unavailable: u64,

    /// 送达失败
    pub delivery_failed: u64,

    /// 节点解析次数
    pub resolutions: u64,

    /// 健康复核次数
    pub validations: u64,

    /// 上传耗时统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各错误类别计数
    pub error_counts: HashMap<String, u64>,
}

impl DispatchAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次分发结果
    pub fn record_outcome(&mut self, outcome: DispatchOutcome) {
        self.total_dispatches += 1;
        match outcome {
            DispatchOutcome::Delivered => self.delivered += 1,
            DispatchOutcome::NodeUnavailable => self.node_unavailable += 1,
            DispatchOutcome::DeliveryFailed => self.delivery_failed += 1,
        }
    }

    /// 记录错误类别
    pub fn record_error(&mut self, error: &LinkError) {
        *self.error_counts.entry(error.kind().to_string()).or_insert(0) += 1;
    }

    /// 记录上传耗时
    pub fn record_latency_ms(&mut self, latency_ms: f64) {
        self.latency_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total_dispatches: self.total_dispatches,
            delivered: self.delivered,
            node_unavailable: self.node_unavailable,
            delivery_failed: self.delivery_failed,
            resolutions: self.resolutions,
            validations: self.validations,
            delivery_rate: if self.total_dispatches > 0 {
                self.delivered as f64 / self.total_dispatches as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            error_counts: self.error_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 分发摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_dispatches: u64,
    pub delivered: u64,
    pub node_unavailable: u64,
    pub delivery_failed: u64,
    pub resolutions: u64,
    pub validations: u64,
    pub delivery_rate: f64,
    pub latency_ms: StatsSummary,
    pub error_counts: HashMap<String, u64>,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total dispatches: {}", self.total_dispatches)?;
        writeln!(
            f,
            "Delivered: {} ({:.2}%)",
            self.delivered, self.delivery_rate
        )?;
        writeln!(f, "Node unavailable: {}", self.node_unavailable)?;
        writeln!(f, "Delivery failed: {}", self.delivery_failed)?;
        writeln!(
            f,
            "Resolutions: {}, validations: {}",
            self.resolutions, self.validations
        )?;
        writeln!(f, "Delivery latency (ms): {}", self.latency_ms)?;

        if !self.error_counts.is_empty() {
            writeln!(f, "Errors:")?;
            let mut kinds: Vec<_> = self.error_counts.iter().collect();
            kinds.sort();
            for (kind, count) in kinds {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
