//! 设备驱动抽象
//!
//! 真实驱动（BLE 回调、数据同步回调、蓝牙串口读取）与 Mock 驱动的共同接口。
//! 驱动在自己的线程上产生读数，通过回调写入仓库。

use std::sync::Arc;

use contracts::{Channel, Device, SensorValue};

/// 读数回调
///
/// 可能在任意线程被调用，实现必须是非阻塞的。
pub type ReadingCallback = Arc<dyn Fn(Channel, SensorValue) + Send + Sync>;

/// 设备驱动 trait
pub trait DeviceDriver: Send + Sync {
    /// 驱动对应的设备
    fn device(&self) -> Device;

    /// 开始产生读数
    ///
    /// 幂等：已在运行时再次调用不产生效果。
    fn start(&self, callback: ReadingCallback);

    /// 停止产生读数
    ///
    /// 返回后不再调用回调，之后可以重新 start。
    fn stop(&self);

    fn is_running(&self) -> bool;
}
