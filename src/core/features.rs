//! Feature derivation from device channel state.
//!
//! Each device exposes a flat list of named features in the 0-1 range. The
//! list is recomputed on every request from the current channel values and
//! detector state.

use crate::core::device::{ChannelKey, Device, DeviceKind, Role};
use serde::{Deserialize, Serialize};

/// One named feature value for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSource {
    /// Kind of the device producing the feature
    pub device_type: DeviceKind,
    /// Identifier of the device
    pub device_id: String,
    /// Feature name, e.g. `touchSelf`
    pub feature_name: String,
    /// Feature value, normally 0-1
    pub value: f64,
}

impl FeatureSource {
    pub fn new(device: &Device, feature_name: &str, value: f64) -> Self {
        Self {
            device_type: device.kind(),
            device_id: device.id().to_string(),
            feature_name: feature_name.to_string(),
            value,
        }
    }
}

impl Device {
    /// Numeric value of `key`, but only while its proximity guard is set.
    fn gated(&self, guard: ChannelKey, key: ChannelKey) -> f64 {
        if self.flag(guard) {
            self.number(key).unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Compute the full feature list for this device.
    pub fn sources(&self) -> Vec<FeatureSource> {
        let features: Vec<(&str, f64)> = match (self.kind(), self.is_tps()) {
            (DeviceKind::Orf, false) => vec![
                (
                    "touchSelf",
                    self.gated(ChannelKey::TouchSelfClose, ChannelKey::TouchSelf),
                ),
                (
                    "touchOthers",
                    self.gated(ChannelKey::TouchOthersClose, ChannelKey::TouchOthers),
                ),
                (
                    "penSelfLegacy",
                    self.legacy_pen_amount(Role::Own).unwrap_or(0.0),
                ),
                ("penSelfNew", self.new_pen_amount(Role::Own).unwrap_or(0.0)),
                ("penSelf", self.pen_amount(Role::Own).unwrap_or(0.0)),
                (
                    "penOthersLegacy",
                    self.legacy_pen_amount(Role::Others).unwrap_or(0.0),
                ),
                (
                    "penOthersNew",
                    self.new_pen_amount(Role::Others).unwrap_or(0.0),
                ),
                ("penOthers", self.pen_amount(Role::Others).unwrap_or(0.0)),
                (
                    "frotOthers",
                    self.number(ChannelKey::FrotOthers).unwrap_or(0.0),
                ),
            ],
            (DeviceKind::Pen, false) => vec![
                (
                    "touchSelf",
                    self.gated(ChannelKey::TouchSelfClose, ChannelKey::TouchSelf),
                ),
                (
                    "touchOthers",
                    self.gated(ChannelKey::TouchOthersClose, ChannelKey::TouchOthers),
                ),
                ("penSelf", self.legacy_pen_amount(Role::Own).unwrap_or(0.0)),
                (
                    "penOthers",
                    self.legacy_pen_amount(Role::Others).unwrap_or(0.0),
                ),
                (
                    "frotOthers",
                    self.gated(ChannelKey::FrotOthersClose, ChannelKey::FrotOthers),
                ),
            ],
            (DeviceKind::Orf, true) => vec![(
                "penOthers",
                self.number(ChannelKey::DepthIn).unwrap_or(0.0),
            )],
            (DeviceKind::Pen, true) => vec![(
                "penOthers",
                self.number(ChannelKey::RootRoot).unwrap_or(0.0),
            )],
        };

        features
            .into_iter()
            .map(|(name, value)| FeatureSource::new(self, name, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{OscValue, ValueChannel};

    fn device(kind: DeviceKind, tps: bool, keys: &[(&str, OscValue)]) -> Device {
        let mut device = Device::new(kind, "dev", tps);
        for (key, value) in keys {
            device.add_key(*key, ValueChannel::with_value(*value));
        }
        device
    }

    fn feature(sources: &[FeatureSource], name: &str) -> f64 {
        sources
            .iter()
            .find(|s| s.feature_name == name)
            .map(|s| s.value)
            .unwrap_or_else(|| panic!("missing feature {name}"))
    }

    fn names(sources: &[FeatureSource]) -> Vec<&str> {
        sources.iter().map(|s| s.feature_name.as_str()).collect()
    }

    #[test]
    fn test_orf_feature_names() {
        let sources = device(DeviceKind::Orf, false, &[]).sources();
        assert_eq!(
            names(&sources),
            vec![
                "touchSelf",
                "touchOthers",
                "penSelfLegacy",
                "penSelfNew",
                "penSelf",
                "penOthersLegacy",
                "penOthersNew",
                "penOthers",
                "frotOthers",
            ]
        );
        assert!(sources.iter().all(|s| s.value == 0.0));
        assert!(sources.iter().all(|s| s.device_type == DeviceKind::Orf));
    }

    #[test]
    fn test_pen_feature_names() {
        let sources = device(DeviceKind::Pen, false, &[]).sources();
        assert_eq!(
            names(&sources),
            vec!["touchSelf", "touchOthers", "penSelf", "penOthers", "frotOthers"]
        );
    }

    #[test]
    fn test_touch_requires_close_flag() {
        let open = device(
            DeviceKind::Orf,
            false,
            &[
                ("TouchSelfClose", OscValue::Bool(false)),
                ("TouchSelf", OscValue::Number(0.8)),
            ],
        );
        assert_eq!(feature(&open.sources(), "touchSelf"), 0.0);

        let close = device(
            DeviceKind::Orf,
            false,
            &[
                ("TouchSelfClose", OscValue::Bool(true)),
                ("TouchSelf", OscValue::Number(0.8)),
            ],
        );
        assert_eq!(feature(&close.sources(), "touchSelf"), 0.8);
    }

    #[test]
    fn test_close_flag_without_value_is_zero() {
        let d = device(
            DeviceKind::Pen,
            false,
            &[("TouchOthersClose", OscValue::Bool(true))],
        );
        assert_eq!(feature(&d.sources(), "touchOthers"), 0.0);
    }

    #[test]
    fn test_frot_gating_differs_by_kind() {
        let keys = [("FrotOthers", OscValue::Number(0.6))];
        let orf = device(DeviceKind::Orf, false, &keys);
        assert_eq!(feature(&orf.sources(), "frotOthers"), 0.6);

        let pen = device(DeviceKind::Pen, false, &keys);
        assert_eq!(feature(&pen.sources(), "frotOthers"), 0.0);

        let pen = device(
            DeviceKind::Pen,
            false,
            &[
                ("FrotOthers", OscValue::Number(0.6)),
                ("FrotOthersClose", OscValue::Bool(true)),
            ],
        );
        assert_eq!(feature(&pen.sources(), "frotOthers"), 0.6);
    }

    #[test]
    fn test_pen_uses_legacy_only() {
        let mut d = device(
            DeviceKind::Pen,
            false,
            &[
                ("PenSelf", OscValue::Number(0.3)),
                ("PenSelfNewRoot", OscValue::Number(0.1)),
                ("PenSelfNewTip", OscValue::Number(0.5)),
            ],
        );
        for _ in 0..4 {
            d.on_key_change("PenSelfNewTip");
        }
        d.set_value("PenSelfNewTip", Some(OscValue::Number(0.995)));
        d.set_value("PenSelfNewRoot", Some(OscValue::Number(0.8)));
        assert!(d.new_pen_amount(Role::Own).is_some());
        assert_eq!(feature(&d.sources(), "penSelf"), 0.3);
    }

    #[test]
    fn test_orf_pen_combines_new_and_legacy() {
        let mut d = device(
            DeviceKind::Orf,
            false,
            &[
                ("PenOthers", OscValue::Number(0.9)),
                ("PenOthersNewRoot", OscValue::Number(0.1)),
                ("PenOthersNewTip", OscValue::Number(0.5)),
            ],
        );
        let sources = d.sources();
        assert_eq!(feature(&sources, "penOthersLegacy"), 0.9);
        assert_eq!(feature(&sources, "penOthersNew"), 0.0);
        assert_eq!(feature(&sources, "penOthers"), 0.9);

        for _ in 0..4 {
            d.on_key_change("PenOthersNewTip");
        }
        let sources = d.sources();
        assert_eq!(feature(&sources, "penOthersNew"), 0.0);
        assert_eq!(feature(&sources, "penOthers"), 0.0);
        assert_eq!(feature(&sources, "penOthersLegacy"), 0.9);
    }

    #[test]
    fn test_tps_features() {
        let orf = device(DeviceKind::Orf, true, &[("Depth_In", OscValue::Number(0.45))]);
        let sources = orf.sources();
        assert_eq!(names(&sources), vec!["penOthers"]);
        assert_eq!(sources[0].value, 0.45);

        let pen = device(DeviceKind::Pen, true, &[("RootRoot", OscValue::Number(0.2))]);
        assert_eq!(pen.sources()[0].value, 0.2);

        let empty = device(DeviceKind::Pen, true, &[]);
        assert_eq!(empty.sources()[0].value, 0.0);
    }

    #[test]
    fn test_source_serialization() {
        let d = device(DeviceKind::Orf, true, &[]);
        let json = serde_json::to_value(&d.sources()[0]).unwrap();
        assert_eq!(json["device_type"], "orf");
        assert_eq!(json["device_id"], "dev");
        assert_eq!(json["feature_name"], "penOthers");
    }
}
