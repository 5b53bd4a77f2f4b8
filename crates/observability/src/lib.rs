//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，RUST_LOG 过滤)
//! - Prometheus 指标导出与指标说明注册
//! - 采样 tick、节点解析、分发结果的指标记录与会话内统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{LogFormat, ObservabilityConfig};
//!
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: None,
//!     ..Default::default()
//! })?;
//!
//! let outcome = controller.dispatch(&frame).await;
//! observability::record_dispatch_outcome(outcome);
//! ```

pub mod metrics;

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_delivery_latency_ms, record_dispatch_outcome, record_frame_skipped,
    record_link_error, record_resolution, record_tick, record_validation, DispatchAggregator,
    DispatchSummary, RunningStats, StatsSummary,
};

/// 默认 Prometheus 端口
pub const DEFAULT_METRICS_PORT: u16 = 9464;

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// RUST_LOG 未设置时的过滤规则
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: Some(DEFAULT_METRICS_PORT),
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => bail!("unknown log format '{other}' (expected json, pretty or compact)"),
        }
    }
}

/// 使用默认配置初始化（JSON 日志 + Prometheus）
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    init_tracing(config.log_format, &config.default_log_level)?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "observability initialized"
    );
    Ok(())
}

/// 仅初始化 Tracing
///
/// 已有全局 subscriber 时返回错误。
pub fn init_tracing(log_format: LogFormat, default_log_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_level));

    let fmt_layer = match log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")
}

/// 仅初始化 Prometheus 指标
///
/// 安装 recorder 后注册各指标的说明文字。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("failed to install Prometheus recorder")?;

    crate::metrics::describe();
    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
