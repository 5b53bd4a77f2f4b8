//! # Dispatcher
//!
//! 帧分发模块。
//!
//! 负责：
//! - 每帧执行节点状态机（直接送达 / 健康复核 / 重新解析）
//! - 将帧编码为扁平 JSON 记录并上传
//! - 有界交接队列，慢上传不阻塞采样

pub mod controller;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod mock;
pub mod uploader;
pub mod wire;

pub use contracts::{DispatchOutcome, DispatchState, FrameUploader, OutboundFrame};
pub use controller::DispatchController;
pub use error::{DeliveryError, DispatcherError};
pub use handle::{DispatchHandle, FrameSender};
pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot};
pub use mock::{MockUploader, RecordedUpload};
pub use uploader::HttpUploader;
pub use wire::{WireRecord, DEFAULT_USER_ID};
