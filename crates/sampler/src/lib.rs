//! # Sampler
//!
//! 固定周期帧采样。
//!
//! 负责：
//! - 按配置间隔（默认 200 ms）复制传感器仓库
//! - 组装带时间戳的 `OutboundFrame`
//! - 非阻塞交给分发队列，忙时跳过
//!
//! ## 使用示例
//!
//! ```ignore
//! use sampler::FrameSampler;
//!
//! let sampler = FrameSampler::new(repos, handle.sender(), session_id, &config.sampler);
//! let running = sampler.start();
//! // ...
//! let stats = running.stop().await;
//! ```

mod metrics;
mod sampler;

pub use metrics::{SamplerMetrics, SamplerMetricsSnapshot};
pub use sampler::{FrameSampler, SamplerHandle};
