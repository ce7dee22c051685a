//! The set of devices seen so far.
//!
//! Devices are created the first time an update names them and live until
//! the set is dropped.

use crate::channel::{ChannelUpdate, ValueChannel};
use crate::core::device::{Device, DeviceKind};
use crate::core::features::FeatureSource;
use crate::core::length::SampleOutcome;
use std::collections::BTreeMap;

/// Result of applying one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyResult {
    /// The device kind was not recognised
    UnknownDevice,
    /// The value was stored; a detector outcome is attached for root/tip keys
    Applied(Option<SampleOutcome>),
}

/// Devices keyed by kind and id.
#[derive(Debug, Default)]
pub struct DeviceSet {
    devices: BTreeMap<(DeviceKind, String), Device>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an inbound update, creating the device and channel as needed.
    pub fn apply(&mut self, update: &ChannelUpdate) -> ApplyResult {
        let Some(kind) = DeviceKind::parse(&update.device) else {
            tracing::debug!(device = %update.device, "Ignoring update for unknown device kind");
            return ApplyResult::UnknownDevice;
        };

        let device = self
            .devices
            .entry((kind, update.id.clone()))
            .or_insert_with(|| {
                tracing::info!(device = %kind, id = %update.id, tps = update.tps, "New device");
                Device::new(kind, update.id.clone(), update.tps)
            });

        if !device.has_key(&update.key) {
            device.add_key(update.key.clone(), ValueChannel::new());
        }
        ApplyResult::Applied(device.set_value(&update.key, update.value))
    }

    /// Look up a device.
    pub fn get(&self, kind: DeviceKind, id: &str) -> Option<&Device> {
        self.devices.get(&(kind, id.to_string()))
    }

    /// Devices in kind, then id order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Feature list across all devices.
    pub fn sources(&self) -> Vec<FeatureSource> {
        self.iter().flat_map(|d| d.sources()).collect()
    }

    /// Status of every device, separated by blank lines.
    pub fn status(&self) -> String {
        self.iter()
            .map(|d| d.status())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
