//! OutboundFrame - FrameSampler output
//!
//! One timestamped snapshot of all sensor channels plus device-connectivity
//! flags, the atomic unit of upload.

use chrono::{DateTime, Utc};

use crate::{Channel, Device, SensorValue, SessionId};

/// Immutable copy of one device repository
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    device: Device,
    connected: bool,
    values: Vec<Option<SensorValue>>,
}

impl DeviceSnapshot {
    /// Snapshot with every channel absent
    pub fn empty(device: Device) -> Self {
        Self {
            device,
            connected: false,
            values: vec![None; device.channels().len()],
        }
    }

    /// Build from slot-ordered values
    ///
    /// Missing trailing slots are treated as absent, extra slots are ignored.
    pub fn from_slots(device: Device, connected: bool, mut values: Vec<Option<SensorValue>>) -> Self {
        values.resize(device.channels().len(), None);
        Self {
            device,
            connected,
            values,
        }
    }

    /// Set the connected flag (builder style)
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Set one channel (builder style); channels of other devices are ignored
    pub fn with_value(mut self, channel: Channel, value: impl Into<SensorValue>) -> Self {
        if channel.device() == self.device {
            self.values[channel.slot()] = Some(value.into());
        }
        self
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Value of a channel, `None` when absent or owned by another device
    pub fn value(&self, channel: Channel) -> Option<SensorValue> {
        if channel.device() != self.device {
            return None;
        }
        self.values.get(channel.slot()).copied().flatten()
    }

    /// Iterate `(channel, value)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, Option<SensorValue>)> + '_ {
        self.device
            .channels()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Number of channels that hold a value
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Frame handed from the sampler to the dispatcher
///
/// Created once per tick and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundFrame {
    session_id: SessionId,
    tick: u64,
    timestamp: DateTime<Utc>,
    band: DeviceSnapshot,
    watch: DeviceSnapshot,
    board: DeviceSnapshot,
}

impl OutboundFrame {
    /// Assemble a frame from the three device snapshots
    ///
    /// Snapshots are matched by their device; a missing device is filled with
    /// an empty, disconnected snapshot.
    pub fn new(
        session_id: SessionId,
        tick: u64,
        timestamp: DateTime<Utc>,
        snapshots: impl IntoIterator<Item = DeviceSnapshot>,
    ) -> Self {
        let mut band = DeviceSnapshot::empty(Device::Band);
        let mut watch = DeviceSnapshot::empty(Device::Watch);
        let mut board = DeviceSnapshot::empty(Device::Board);
        for snapshot in snapshots {
            match snapshot.device() {
                Device::Band => band = snapshot,
                Device::Watch => watch = snapshot,
                Device::Board => board = snapshot,
            }
        }
        Self {
            session_id,
            tick,
            timestamp,
            band,
            watch,
            board,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Snapshot of one device
    pub fn device(&self, device: Device) -> &DeviceSnapshot {
        match device {
            Device::Band => &self.band,
            Device::Watch => &self.watch,
            Device::Board => &self.board,
        }
    }

    /// Value of any channel
    pub fn value(&self, channel: Channel) -> Option<SensorValue> {
        self.device(channel.device()).value(channel)
    }

    /// Connected flag of a device
    pub fn connected(&self, device: Device) -> bool {
        self.device(device).connected()
    }

    /// Channels holding a value across all devices
    pub fn present_count(&self) -> usize {
        Device::ALL
            .iter()
            .map(|d| self.device(*d).present_count())
            .sum()
    }
}
