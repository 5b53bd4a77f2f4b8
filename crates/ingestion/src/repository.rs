//! SensorRepository - 单设备最新读数缓存
//!
//! 每个通道一把锁，写入方只持有自己通道的锁，读取方逐通道复制。
//! 不提供跨通道的原子快照，通道之间没有顺序保证。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{Channel, Device, DeviceSnapshot, SensorValue};
use metrics::counter;
use tracing::trace;

use crate::error::{IngestionError, Result};

type Cell = Mutex<Option<SensorValue>>;

/// 单设备的读数仓库
///
/// 由设备驱动线程并发写入，由采样器读取。写入为 last-write-wins。
#[derive(Debug)]
pub struct SensorRepository {
    device: Device,
    cells: Vec<Cell>,
    connected: AtomicBool,
    writes: AtomicU64,
}

impl SensorRepository {
    /// 创建空仓库（所有通道缺失，未连接）
    pub fn new(device: Device) -> Self {
        Self {
            device,
            cells: device.channels().iter().map(|_| Mutex::new(None)).collect(),
            connected: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    fn cell(&self, slot: usize) -> MutexGuard<'_, Option<SensorValue>> {
        // 仅保存一个 Copy 值，持锁者 panic 不会留下半写状态
        self.cells[slot].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 覆盖通道的最新值
    ///
    /// 通道不属于本设备时返回错误，状态不变。
    pub fn write(&self, channel: Channel, value: impl Into<SensorValue>) -> Result<()> {
        if channel.device() != self.device {
            return Err(IngestionError::foreign_channel(self.device, channel));
        }

        let value = value.into();
        *self.cell(channel.slot()) = Some(value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        counter!("telemetry_readings_total", "device" => self.device.name()).increment(1);
        trace!(device = %self.device, channel = channel.wire_key(), %value, "reading stored");
        Ok(())
    }

    /// 读取单个通道
    pub fn get(&self, channel: Channel) -> Option<SensorValue> {
        if channel.device() != self.device {
            return None;
        }
        *self.cell(channel.slot())
    }

    /// 复制所有通道的当前值
    pub fn snapshot(&self) -> DeviceSnapshot {
        let values = (0..self.cells.len()).map(|slot| *self.cell(slot)).collect();
        DeviceSnapshot::from_slots(self.device, self.is_connected(), values)
    }

    /// 清空所有通道，连接标志不变
    pub fn reset(&self) {
        for slot in 0..self.cells.len() {
            *self.cell(slot) = None;
        }
        self.writes.store(0, Ordering::Relaxed);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 自上次 reset 以来的写入次数
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}
