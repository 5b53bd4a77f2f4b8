//! Mock 设备驱动
//!
//! 在后台线程按固定频率生成合成读数，用于无真实设备的测试与开发。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{Channel, Device, SensorValue};
use tracing::{debug, trace, warn};

use crate::driver::{DeviceDriver, ReadingCallback};
use crate::error::{IngestionError, Result};

/// Mock 驱动配置
#[derive(Debug, Clone)]
pub struct MockDriverConfig {
    /// 每秒产生的读数轮数
    pub frequency_hz: f64,
}

impl Default for MockDriverConfig {
    fn default() -> Self {
        Self { frequency_hz: 20.0 }
    }
}

/// Mock 设备驱动
///
/// 每一轮为设备的所有通道各写入一个合成值。
pub struct MockDriver {
    device: Device,
    config: MockDriverConfig,
    running: Arc<AtomicBool>,
    rounds: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockDriver {
    pub fn new(device: Device, config: MockDriverConfig) -> Result<Self> {
        if !(config.frequency_hz.is_finite() && config.frequency_hz > 0.0) {
            return Err(IngestionError::InvalidFrequency {
                device,
                frequency_hz: config.frequency_hz,
            });
        }
        Ok(Self {
            device,
            config,
            running: Arc::new(AtomicBool::new(false)),
            rounds: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        })
    }

    pub fn with_defaults(device: Device) -> Self {
        Self {
            device,
            config: MockDriverConfig::default(),
            running: Arc::new(AtomicBool::new(false)),
            rounds: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// 已完成的读数轮数
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::Relaxed)
    }

    /// 第 `round` 轮中某个通道的合成值
    fn synthetic_value(channel: Channel, round: u64) -> SensorValue {
        let phase = (round % 20) as f64 / 20.0;
        let wave = (phase * std::f64::consts::TAU).sin();
        match channel {
            Channel::WatchHeartRate | Channel::WatchHeartRateRaw | Channel::BandHeartRate => {
                SensorValue::Int(70 + (wave * 5.0).round() as i64)
            }
            Channel::BoardBpm => SensorValue::Int(72 + (wave * 4.0).round() as i64),
            Channel::WatchStep => SensorValue::Int(round as i64),
            Channel::BoardOxygen => SensorValue::Int(97),
            Channel::BoardAirflow => SensorValue::Int(300 + (wave * 100.0).round() as i64),
            Channel::BandTemperature => SensorValue::Float(33.0 + wave * 0.2),
            Channel::BandGsr => SensorValue::Float(0.4 + wave * 0.05),
            Channel::BandIbi => SensorValue::Float(0.85 + wave * 0.03),
            Channel::BandBvp => SensorValue::Float(wave * 50.0),
            Channel::WatchAccZ | Channel::BandAccZ => SensorValue::Float(9.81 + wave * 0.1),
            _ => SensorValue::Float(wave * 0.5),
        }
    }
}

impl DeviceDriver for MockDriver {
    fn device(&self) -> Device {
        self.device
    }

    fn start(&self, callback: ReadingCallback) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let device = self.device;
        let running = self.running.clone();
        let rounds = self.rounds.clone();
        let interval = Duration::from_secs_f64(1.0 / self.config.frequency_hz);
        let frequency_hz = self.config.frequency_hz;

        *worker = Some(thread::spawn(move || {
            debug!(%device, frequency_hz, "mock driver started");

            while running.load(Ordering::Relaxed) {
                let round = rounds.fetch_add(1, Ordering::Relaxed);
                for channel in device.channels() {
                    callback(*channel, Self::synthetic_value(*channel, round));
                }
                trace!(%device, round, "mock readings written");

                thread::sleep(interval);
            }

            debug!(%device, "mock driver stopped");
        }));
    }

    /// 停止并等待写入线程退出，返回后不会再有回调
    fn stop(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                warn!(device = %self.device, "mock driver thread panicked");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for MockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RepositorySet;

    #[test]
    fn test_mock_driver_writes_all_channels() {
        let set = RepositorySet::new();
        let driver = MockDriver::new(Device::Band, MockDriverConfig { frequency_hz: 200.0 }).unwrap();

        driver.start(set.callback_for(Device::Band));
        thread::sleep(Duration::from_millis(50));
        driver.stop();

        assert!(driver.rounds() > 0);
        assert_eq!(
            set.repository(Device::Band).snapshot().present_count(),
            Device::Band.channels().len()
        );
        assert!(!driver.is_running());
    }

    #[test]
    fn test_mock_driver_idempotent_start() {
        let driver = MockDriver::with_defaults(Device::Watch);
        let calls = Arc::new(AtomicU64::new(0));

        let first = calls.clone();
        driver.start(Arc::new(move |_, _| {
            first.fetch_add(1, Ordering::Relaxed);
        }));

        let second = calls.clone();
        driver.start(Arc::new(move |_, _| {
            second.fetch_add(1_000_000, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(30));
        driver.stop();

        assert!(calls.load(Ordering::Relaxed) < 1_000_000);
    }

    #[test]
    fn test_restart_leaves_single_writer() {
        let driver =
            MockDriver::new(Device::Board, MockDriverConfig { frequency_hz: 100.0 }).unwrap();
        let old_calls = Arc::new(AtomicU64::new(0));
        let new_calls = Arc::new(AtomicU64::new(0));

        let old = old_calls.clone();
        driver.start(Arc::new(move |_, _| {
            old.fetch_add(1, Ordering::Relaxed);
        }));
        thread::sleep(Duration::from_millis(30));
        driver.stop();
        let old_at_stop = old_calls.load(Ordering::Relaxed);

        let new = new_calls.clone();
        driver.start(Arc::new(move |_, _| {
            new.fetch_add(1, Ordering::Relaxed);
        }));
        thread::sleep(Duration::from_millis(50));
        driver.stop();

        assert!(old_at_stop > 0);
        assert_eq!(old_calls.load(Ordering::Relaxed), old_at_stop);
        assert!(new_calls.load(Ordering::Relaxed) > 0);
        assert!(!driver.is_running());
    }

    #[test]
    fn test_invalid_frequency_rejected() {
        assert!(MockDriver::new(Device::Board, MockDriverConfig { frequency_hz: 0.0 }).is_err());
        assert!(
            MockDriver::new(Device::Board, MockDriverConfig { frequency_hz: f64::NAN }).is_err()
        );
    }

    #[test]
    fn test_synthetic_heart_rate_is_plausible() {
        for round in 0..40 {
            let value = MockDriver::synthetic_value(Channel::WatchHeartRate, round);
            assert!((60.0..=80.0).contains(&value.as_f64()));
        }
    }
}
