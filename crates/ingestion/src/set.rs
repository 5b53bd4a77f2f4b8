//! RepositorySet - 三个设备仓库的集合

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{Channel, Device, DeviceSnapshot, SensorValue};

use crate::driver::ReadingCallback;
use crate::error::Result;
use crate::repository::SensorRepository;

/// band / watch / board 三个仓库
///
/// 克隆开销很小，所有克隆共享同一组仓库和同一个采样租约。
#[derive(Debug, Clone)]
pub struct RepositorySet {
    band: Arc<SensorRepository>,
    watch: Arc<SensorRepository>,
    board: Arc<SensorRepository>,
    leased: Arc<AtomicBool>,
}

/// 采样租约
///
/// 同一组仓库同一时刻最多一个持有者，drop 时释放。
#[derive(Debug)]
pub struct RepositoryLease {
    leased: Arc<AtomicBool>,
}

impl Drop for RepositoryLease {
    fn drop(&mut self) {
        self.leased.store(false, Ordering::Release);
    }
}

impl Default for RepositorySet {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositorySet {
    pub fn new() -> Self {
        Self {
            band: Arc::new(SensorRepository::new(Device::Band)),
            watch: Arc::new(SensorRepository::new(Device::Watch)),
            board: Arc::new(SensorRepository::new(Device::Board)),
            leased: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 获取采样租约，已被持有时返回 `None`
    pub fn try_lease(&self) -> Option<RepositoryLease> {
        self.leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RepositoryLease {
                leased: Arc::clone(&self.leased),
            })
    }

    pub fn is_leased(&self) -> bool {
        self.leased.load(Ordering::Acquire)
    }

    /// 指定设备的仓库
    pub fn repository(&self, device: Device) -> &Arc<SensorRepository> {
        match device {
            Device::Band => &self.band,
            Device::Watch => &self.watch,
            Device::Board => &self.board,
        }
    }

    /// 按通道所属设备路由写入
    pub fn write(&self, channel: Channel, value: impl Into<SensorValue>) -> Result<()> {
        self.repository(channel.device()).write(channel, value)
    }

    pub fn get(&self, channel: Channel) -> Option<SensorValue> {
        self.repository(channel.device()).get(channel)
    }

    pub fn set_connected(&self, device: Device, connected: bool) {
        self.repository(device).set_connected(connected);
    }

    pub fn reset_all(&self) {
        for device in Device::ALL {
            self.repository(device).reset();
        }
    }

    /// 按 band, watch, board 顺序复制三个仓库
    pub fn snapshot_all(&self) -> [DeviceSnapshot; 3] {
        Device::ALL.map(|device| self.repository(device).snapshot())
    }

    /// 已连接设备数
    pub fn connected_count(&self) -> usize {
        Device::ALL
            .iter()
            .filter(|device| self.repository(**device).is_connected())
            .count()
    }

    /// 已连接的设备
    pub fn connected_devices(&self) -> Vec<Device> {
        Device::ALL
            .into_iter()
            .filter(|device| self.repository(*device).is_connected())
            .collect()
    }

    /// 生成写入指定设备仓库的驱动回调
    ///
    /// 不属于该设备的通道被丢弃并记录 warn 日志。
    pub fn callback_for(&self, device: Device) -> ReadingCallback {
        let repo = self.repository(device).clone();
        Arc::new(move |channel, value| {
            if let Err(e) = repo.write(channel, value) {
                tracing::warn!(error = %e, "driver reading dropped");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_routes_by_device() {
        let set = RepositorySet::new();
        set.write(Channel::BandGsr, 0.42).unwrap();
        set.write(Channel::BoardBpm, 80).unwrap();

        let [band, watch, board] = set.snapshot_all();
        assert_eq!(band.value(Channel::BandGsr), Some(SensorValue::Float(0.42)));
        assert_eq!(watch.present_count(), 0);
        assert_eq!(board.value(Channel::BoardBpm), Some(SensorValue::Int(80)));
    }

    #[test]
    fn test_lease_is_exclusive_across_clones() {
        let set = RepositorySet::new();
        let other = set.clone();

        let lease = set.try_lease().unwrap();
        assert!(other.is_leased());
        assert!(other.try_lease().is_none());

        drop(lease);
        assert!(!set.is_leased());
        assert!(other.try_lease().is_some());
    }

    #[test]
    fn test_connected_count() {
        let set = RepositorySet::new();
        assert_eq!(set.connected_count(), 0);

        set.set_connected(Device::Watch, true);
        set.set_connected(Device::Board, true);
        assert_eq!(set.connected_count(), 2);
        assert_eq!(set.connected_devices(), vec![Device::Watch, Device::Board]);
    }

    #[test]
    fn test_reset_all() {
        let set = RepositorySet::new();
        set.write(Channel::WatchStep, 1200).unwrap();
        set.write(Channel::BandTemperature, 33.1).unwrap();

        set.reset_all();

        assert!(set.snapshot_all().iter().all(|s| s.present_count() == 0));
    }

    #[test]
    fn test_callback_writes_and_drops_foreign() {
        let set = RepositorySet::new();
        let callback = set.callback_for(Device::Watch);

        callback(Channel::WatchHeartRate, SensorValue::Int(64));
        callback(Channel::BoardBpm, SensorValue::Int(90));

        assert_eq!(set.get(Channel::WatchHeartRate), Some(SensorValue::Int(64)));
        assert_eq!(set.get(Channel::BoardBpm), None);
    }

    #[test]
    fn test_clones_share_repositories() {
        let set = RepositorySet::new();
        let clone = set.clone();
        clone.write(Channel::BandIbi, 0.8).unwrap();
        assert_eq!(set.get(Channel::BandIbi), Some(SensorValue::Float(0.8)));
    }
}
