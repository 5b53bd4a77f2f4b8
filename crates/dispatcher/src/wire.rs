//! Upload record encoding
//!
//! One flat JSON object per frame. Sensor values travel as strings, absent
//! values as empty strings, connectivity flags as booleans. NaN and infinite
//! readings are sent like absent values.

use chrono::SecondsFormat;
use contracts::{Channel, Device, OutboundFrame};
use serde::Serialize;
use serde_json::{Map, Value};

pub const SESSION_ID_KEY: &str = "session_id";
pub const TIMESTAMP_KEY: &str = "timeStamp";
pub const USER_ID_KEY: &str = "user_id";

/// Default user id attached to every record
pub const DEFAULT_USER_ID: &str = "user_app";

/// Flat upload record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WireRecord(Map<String, Value>);

impl WireRecord {
    pub fn from_frame(frame: &OutboundFrame, user_id: &str) -> Self {
        let mut fields = Map::new();

        fields.insert(
            SESSION_ID_KEY.to_string(),
            Value::String(frame.session_id().to_string()),
        );
        fields.insert(
            TIMESTAMP_KEY.to_string(),
            Value::String(
                frame
                    .timestamp()
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );

        for channel in Channel::all() {
            let value = frame
                .value(channel)
                .filter(|v| v.is_finite())
                .map(|v| v.to_string())
                .unwrap_or_default();
            fields.insert(channel.wire_key().to_string(), Value::String(value));
        }

        for device in Device::ALL {
            fields.insert(
                device.connected_key().to_string(),
                Value::Bool(frame.connected(device)),
            );
        }

        fields.insert(USER_ID_KEY.to_string(), Value::String(user_id.to_string()));

        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field, `None` for missing or non-string keys
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
