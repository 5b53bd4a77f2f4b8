//! Ingestion 错误类型

use contracts::{Channel, Device};
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestionError {
    /// 写入了不属于该设备的通道
    #[error("channel {channel:?} does not belong to device {device}")]
    ForeignChannel {
        /// 仓库所属设备
        device: Device,
        /// 被拒绝的通道
        channel: Channel,
    },

    /// 驱动频率非法
    #[error("invalid driver frequency for {device}: {frequency_hz} Hz")]
    InvalidFrequency {
        /// 设备
        device: Device,
        /// 配置的频率
        frequency_hz: f64,
    },
}

impl IngestionError {
    pub fn foreign_channel(device: Device, channel: Channel) -> Self {
        Self::ForeignChannel { device, channel }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
