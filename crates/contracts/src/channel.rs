//! Device and channel catalogue
//!
//! Every channel belongs to exactly one device and carries a fixed wire key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor source paired with the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// E4 wrist band (BLE callbacks)
    Band,
    /// TicWatch smartwatch (data-sync callbacks)
    Watch,
    /// eHealth board (Bluetooth serial reader)
    Board,
}

impl Device {
    /// All devices, in frame order
    pub const ALL: [Device; 3] = [Device::Band, Device::Watch, Device::Board];

    /// Short name used in logs and metric labels
    pub fn name(self) -> &'static str {
        match self {
            Device::Band => "band",
            Device::Watch => "watch",
            Device::Board => "board",
        }
    }

    /// Channels owned by this device, in slot order
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Device::Band => &BAND_CHANNELS,
            Device::Watch => &WATCH_CHANNELS,
            Device::Board => &BOARD_CHANNELS,
        }
    }

    /// Wire key of the "device connected" flag
    pub fn connected_key(self) -> &'static str {
        match self {
            Device::Band => "e4connected",
            Device::Watch => "ticwatchconnected",
            Device::Board => "ehealthboardconnected",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const WATCH_CHANNELS: [Channel; 12] = [
    Channel::WatchHeartRate,
    Channel::WatchHeartRateRaw,
    Channel::WatchStep,
    Channel::WatchAccX,
    Channel::WatchAccY,
    Channel::WatchAccZ,
    Channel::WatchLinearAccX,
    Channel::WatchLinearAccY,
    Channel::WatchLinearAccZ,
    Channel::WatchGyroX,
    Channel::WatchGyroY,
    Channel::WatchGyroZ,
];

const BAND_CHANNELS: [Channel; 8] = [
    Channel::BandAccX,
    Channel::BandAccY,
    Channel::BandAccZ,
    Channel::BandBvp,
    Channel::BandHeartRate,
    Channel::BandGsr,
    Channel::BandIbi,
    Channel::BandTemperature,
];

const BOARD_CHANNELS: [Channel; 3] = [
    Channel::BoardBpm,
    Channel::BoardOxygen,
    Channel::BoardAirflow,
];

/// Sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    // Watch
    WatchHeartRate,
    WatchHeartRateRaw,
    WatchStep,
    WatchAccX,
    WatchAccY,
    WatchAccZ,
    WatchLinearAccX,
    WatchLinearAccY,
    WatchLinearAccZ,
    WatchGyroX,
    WatchGyroY,
    WatchGyroZ,
    // Band
    BandAccX,
    BandAccY,
    BandAccZ,
    BandBvp,
    BandHeartRate,
    BandGsr,
    BandIbi,
    BandTemperature,
    // Board
    BoardBpm,
    BoardOxygen,
    BoardAirflow,
}

impl Channel {
    /// Owning device
    pub fn device(self) -> Device {
        use Channel::*;
        match self {
            WatchHeartRate | WatchHeartRateRaw | WatchStep | WatchAccX | WatchAccY | WatchAccZ
            | WatchLinearAccX | WatchLinearAccY | WatchLinearAccZ | WatchGyroX | WatchGyroY
            | WatchGyroZ => Device::Watch,
            BandAccX | BandAccY | BandAccZ | BandBvp | BandHeartRate | BandGsr | BandIbi
            | BandTemperature => Device::Band,
            BoardBpm | BoardOxygen | BoardAirflow => Device::Board,
        }
    }

    /// Key of this channel in the upload record
    pub fn wire_key(self) -> &'static str {
        use Channel::*;
        match self {
            WatchHeartRate => "tic_hrppg",
            WatchHeartRateRaw => "tic_hrppgraw",
            WatchStep => "tic_step",
            WatchAccX => "tic_accx",
            WatchAccY => "tic_accy",
            WatchAccZ => "tic_accz",
            WatchLinearAccX => "tic_acclx",
            WatchLinearAccY => "tic_accly",
            WatchLinearAccZ => "tic_acclz",
            WatchGyroX => "tic_girx",
            WatchGyroY => "tic_giry",
            WatchGyroZ => "tic_girz",
            BandAccX => "e4_accx",
            BandAccY => "e4_accy",
            BandAccZ => "e4_accz",
            BandBvp => "e4_bvp",
            BandHeartRate => "e4_hr",
            BandGsr => "e4_gsr",
            BandIbi => "e4_ibi",
            BandTemperature => "e4_temp",
            BoardBpm => "ehb_bpm",
            BoardOxygen => "ehb_o2",
            BoardAirflow => "ehb_air",
        }
    }

    /// Position of this channel inside its device's slot array
    pub fn slot(self) -> usize {
        self.device()
            .channels()
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }

    /// Every channel of every device, in wire order
    pub fn all() -> impl Iterator<Item = Channel> {
        [Device::Watch, Device::Band, Device::Board]
            .into_iter()
            .flat_map(|d| d.channels().iter().copied())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

/// Numeric reading as produced by a driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Int(i64),
    Float(f64),
}

impl SensorValue {
    /// Value as f64 (lossy for very large integers)
    pub fn as_f64(self) -> f64 {
        match self {
            SensorValue::Int(v) => v as f64,
            SensorValue::Float(v) => v,
        }
    }

    /// False for NaN and infinite floats
    pub fn is_finite(self) -> bool {
        match self {
            SensorValue::Int(_) => true,
            SensorValue::Float(v) => v.is_finite(),
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Int(v) => write!(f, "{v}"),
            SensorValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for SensorValue {
    fn from(v: f64) -> Self {
        SensorValue::Float(v)
    }
}

impl From<f32> for SensorValue {
    fn from(v: f32) -> Self {
        SensorValue::Float(v as f64)
    }
}

impl From<i64> for SensorValue {
    fn from(v: i64) -> Self {
        SensorValue::Int(v)
    }
}

impl From<i32> for SensorValue {
    fn from(v: i32) -> Self {
        SensorValue::Int(v as i64)
    }
}
