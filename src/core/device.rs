//! Per-device channel state.
//!
//! A device owns the channels registered under it, one length detector per
//! contact role, and the protocol version it advertised.

use crate::channel::{OscValue, ValueChannel};
use crate::core::length::{LengthDetector, SampleOutcome, PENETRATING_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of device, as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// A receiver (`Orf`)
    Orf,
    /// An insertable (`Pen`)
    Pen,
}

impl DeviceKind {
    /// Parse the wire name of a device kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Orf" => Some(DeviceKind::Orf),
            "Pen" => Some(DeviceKind::Pen),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Orf => write!(f, "Orf"),
            DeviceKind::Pen => write!(f, "Pen"),
        }
    }
}

/// Whose contact a reading describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Contact with the wearer's own avatar
    Own,
    /// Contact with other avatars
    Others,
}

/// Channel keys this crate knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    TouchSelf,
    TouchOthers,
    PenSelf,
    PenOthers,
    FrotOthers,
    DepthIn,
    RootRoot,
    PenSelfNewRoot,
    PenSelfNewTip,
    PenOthersNewRoot,
    PenOthersNewTip,
    TouchSelfClose,
    TouchOthersClose,
    FrotOthersClose,
}

impl ChannelKey {
    pub const ALL: [ChannelKey; 14] = [
        ChannelKey::TouchSelf,
        ChannelKey::TouchOthers,
        ChannelKey::PenSelf,
        ChannelKey::PenOthers,
        ChannelKey::FrotOthers,
        ChannelKey::DepthIn,
        ChannelKey::RootRoot,
        ChannelKey::PenSelfNewRoot,
        ChannelKey::PenSelfNewTip,
        ChannelKey::PenOthersNewRoot,
        ChannelKey::PenOthersNewTip,
        ChannelKey::TouchSelfClose,
        ChannelKey::TouchOthersClose,
        ChannelKey::FrotOthersClose,
    ];

    /// Look up a key by its exact channel name.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == key)
    }

    /// Exact channel name.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelKey::TouchSelf => "TouchSelf",
            ChannelKey::TouchOthers => "TouchOthers",
            ChannelKey::PenSelf => "PenSelf",
            ChannelKey::PenOthers => "PenOthers",
            ChannelKey::FrotOthers => "FrotOthers",
            ChannelKey::DepthIn => "Depth_In",
            ChannelKey::RootRoot => "RootRoot",
            ChannelKey::PenSelfNewRoot => "PenSelfNewRoot",
            ChannelKey::PenSelfNewTip => "PenSelfNewTip",
            ChannelKey::PenOthersNewRoot => "PenOthersNewRoot",
            ChannelKey::PenOthersNewTip => "PenOthersNewTip",
            ChannelKey::TouchSelfClose => "TouchSelfClose",
            ChannelKey::TouchOthersClose => "TouchOthersClose",
            ChannelKey::FrotOthersClose => "FrotOthersClose",
        }
    }

    /// The detector role fed by this key, for the four root/tip keys.
    pub fn length_role(&self) -> Option<Role> {
        match self {
            ChannelKey::PenSelfNewRoot | ChannelKey::PenSelfNewTip => Some(Role::Own),
            ChannelKey::PenOthersNewRoot | ChannelKey::PenOthersNewTip => Some(Role::Others),
            _ => None,
        }
    }
}

/// Root and tip proximity keys for a role.
fn proximity_keys(role: Role) -> (ChannelKey, ChannelKey) {
    match role {
        Role::Own => (ChannelKey::PenSelfNewRoot, ChannelKey::PenSelfNewTip),
        Role::Others => (ChannelKey::PenOthersNewRoot, ChannelKey::PenOthersNewTip),
    }
}

/// Parse a `Version/<n>` channel key.
pub fn parse_version_key(key: &str) -> Option<u32> {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Version"), Some(ver), None) => ver.parse().ok(),
        _ => None,
    }
}

/// A device and its channel state.
#[derive(Debug, Clone)]
pub struct Device {
    kind: DeviceKind,
    id: String,
    is_tps: bool,
    values: HashMap<String, ValueChannel>,
    self_length: LengthDetector,
    others_length: LengthDetector,
    version: Option<u32>,
}

impl Device {
    /// Create a device with no channels.
    pub fn new(kind: DeviceKind, id: impl Into<String>, is_tps: bool) -> Self {
        Self {
            kind,
            id: id.into(),
            is_tps,
            values: HashMap::new(),
            self_length: LengthDetector::new(),
            others_length: LengthDetector::new(),
            version: None,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the device uses the TPS parameter set.
    pub fn is_tps(&self) -> bool {
        self.is_tps
    }

    /// Advertised protocol version, if any.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Whether a channel is registered under `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Length detector for a role.
    pub fn detector(&self, role: Role) -> &LengthDetector {
        match role {
            Role::Own => &self.self_length,
            Role::Others => &self.others_length,
        }
    }

    fn detector_mut(&mut self, role: Role) -> &mut LengthDetector {
        match role {
            Role::Own => &mut self.self_length,
            Role::Others => &mut self.others_length,
        }
    }

    /// Register a channel under `key`.
    ///
    /// Changes made through [`Device::set_value`] are dispatched to
    /// [`Device::on_key_change`]. A key of the form `Version/<n>` also records
    /// the device version.
    pub fn add_key(&mut self, key: impl Into<String>, channel: ValueChannel) {
        let key = key.into();
        if let Some(ver) = parse_version_key(&key) {
            self.version = Some(ver);
        }
        self.values.insert(key, channel);
    }

    /// Set the value of a registered channel and dispatch the change.
    ///
    /// Returns `None` when the key is not registered, the value did not
    /// change, or the key does not feed a length detector.
    pub fn set_value(&mut self, key: &str, value: Option<OscValue>) -> Option<SampleOutcome> {
        let changed = self.values.get_mut(key)?.set(value);
        if !changed {
            return None;
        }
        self.on_key_change(key)
    }

    /// React to a change of the channel registered under `key`.
    pub fn on_key_change(&mut self, key: &str) -> Option<SampleOutcome> {
        let role = ChannelKey::parse(key)?.length_role()?;
        let (root_key, tip_key) = proximity_keys(role);
        let root = self.number(root_key);
        let tip = self.number(tip_key);
        let outcome = self.detector_mut(role).update(root, tip);
        tracing::trace!(
            device = %self.kind,
            id = %self.id,
            key,
            ?outcome,
            "Length detector updated"
        );
        Some(outcome)
    }

    /// Current value of a known key, if registered and set.
    pub fn get(&self, key: ChannelKey) -> Option<OscValue> {
        self.values.get(key.name()).and_then(|c| c.get())
    }

    /// Current numeric value of a known key.
    pub fn number(&self, key: ChannelKey) -> Option<f64> {
        self.get(key).and_then(|v| v.as_number())
    }

    /// Truthiness of a known key; unregistered or unset keys are false.
    pub fn flag(&self, key: ChannelKey) -> bool {
        self.get(key).map(|v| v.is_truthy()).unwrap_or(false)
    }

    /// Penetration depth from the detected length and current proximity.
    ///
    /// When the tip is inside, the exposed part of the penetrator is
    /// `1 - root`; the result is the unexposed fraction of the detected
    /// length. The value is not clamped, so an underestimated length can push
    /// it outside 0..1.
    pub fn new_pen_amount(&self, role: Role) -> Option<f64> {
        let len = self.detector(role).length().filter(|l| *l > 0.0)?;
        let (root_key, tip_key) = proximity_keys(role);
        let root_prox = self.number(root_key)?;
        let tip_prox = self.number(tip_key)?;
        if tip_prox > PENETRATING_THRESHOLD {
            let exposed_length = 1.0 - root_prox;
            let exposed_ratio = exposed_length / len;
            Some(1.0 - exposed_ratio)
        } else {
            Some(0.0)
        }
    }

    /// Penetration depth reported directly by the avatar.
    pub fn legacy_pen_amount(&self, role: Role) -> Option<f64> {
        match role {
            Role::Own => self.number(ChannelKey::PenSelf),
            Role::Others => self.number(ChannelKey::PenOthers),
        }
    }

    /// Best available penetration depth.
    pub fn pen_amount(&self, role: Role) -> Option<f64> {
        self.new_pen_amount(role)
            .or_else(|| self.legacy_pen_amount(role))
    }

    /// Multi-line human readable status.
    pub fn status(&self) -> String {
        let mut out = vec![format!("{}:{}", self.kind, self.id)];
        if let Some(len) = self.self_length.length() {
            out.push(format!("  Nearby self-penetrator length: {len:.2}m"));
        }
        if let Some(len) = self.others_length.length() {
            out.push(format!("  Nearby penetrator length: {len:.2}m"));
        }
        for source in self.sources() {
            out.push(format!(
                "  {}={}%",
                source.feature_name,
                (source.value * 100.0 + 0.5).floor() as i64
            ));
        }
        match self.version {
            Some(ver) => out.push(format!("  version={ver}")),
            None => out.push("  version=unknown".to_string()),
        }
        out.join("\n")
    }
}
