//! Channel value types for the Contact Sensor Agent.
//!
//! A channel is a named cell that holds the latest value received for one
//! avatar parameter. Values are numbers, booleans, or absent.

use serde::{Deserialize, Serialize};

/// A single parameter value as delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OscValue {
    Bool(bool),
    Number(f64),
}

impl OscValue {
    /// The numeric payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            OscValue::Number(n) => Some(*n),
            OscValue::Bool(_) => None,
        }
    }

    /// Truthiness of the value. Non-zero numbers count as true.
    pub fn is_truthy(&self) -> bool {
        match self {
            OscValue::Bool(b) => *b,
            OscValue::Number(n) => *n != 0.0 && !n.is_nan(),
        }
    }
}

impl From<f64> for OscValue {
    fn from(n: f64) -> Self {
        OscValue::Number(n)
    }
}

impl From<bool> for OscValue {
    fn from(b: bool) -> Self {
        OscValue::Bool(b)
    }
}

/// A named cell holding the current value of one parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueChannel {
    value: Option<OscValue>,
}

impl ValueChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel holding an initial value.
    pub fn with_value(value: impl Into<OscValue>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    /// Current value, if any.
    pub fn get(&self) -> Option<OscValue> {
        self.value
    }

    /// Current value if it is numeric.
    pub fn number(&self) -> Option<f64> {
        self.value.and_then(|v| v.as_number())
    }

    /// Replace the value. Returns true when the stored value changed.
    pub fn set(&mut self, value: Option<OscValue>) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }
}

/// One inbound parameter update, addressed to a device channel.
///
/// This is the JSON-lines record accepted by the replay reader:
///
/// ```json
/// {"device":"Orf","id":"mouth","tps":false,"key":"TouchSelf","value":0.5}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    /// Device kind as it appears on the wire (`Orf` or `Pen`)
    pub device: String,
    /// Device identifier, unique per kind
    pub id: String,
    /// Whether the device uses the TPS parameter set
    #[serde(default)]
    pub tps: bool,
    /// Channel key within the device
    pub key: String,
    /// New value; `null` or missing means the value was cleared
    #[serde(default)]
    pub value: Option<OscValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(OscValue::Bool(true).is_truthy());
        assert!(!OscValue::Bool(false).is_truthy());
        assert!(OscValue::Number(0.3).is_truthy());
        assert!(!OscValue::Number(0.0).is_truthy());
        assert!(!OscValue::Number(f64::NAN).is_truthy());
    }

    #[test]
    fn test_channel_set_reports_change() {
        let mut channel = ValueChannel::new();
        assert!(channel.set(Some(OscValue::Number(0.5))));
        assert!(!channel.set(Some(OscValue::Number(0.5))));
        assert!(channel.set(None));
        assert_eq!(channel.get(), None);
    }

    #[test]
    fn test_bool_channel_has_no_number() {
        let channel = ValueChannel::with_value(true);
        assert_eq!(channel.number(), None);
    }

    #[test]
    fn test_update_parsing() {
        let update: ChannelUpdate = serde_json::from_str(
            r#"{"device":"Pen","id":"p1","key":"TouchSelfClose","value":true}"#,
        )
        .unwrap();
        assert_eq!(update.value, Some(OscValue::Bool(true)));
        assert!(!update.tps);

        let update: ChannelUpdate =
            serde_json::from_str(r#"{"device":"Orf","id":"o","key":"PenSelf","value":0.25}"#)
                .unwrap();
        assert_eq!(update.value, Some(OscValue::Number(0.25)));

        let update: ChannelUpdate =
            serde_json::from_str(r#"{"device":"Orf","id":"o","key":"PenSelf","value":null}"#)
                .unwrap();
        assert_eq!(update.value, None);
    }
}
