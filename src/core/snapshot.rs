//! Feature snapshot builder for export.
//!
//! A snapshot captures the feature list and detector state of every known
//! device at one point in time.

use crate::core::device::{Device, DeviceKind, Role};
use crate::core::device_set::DeviceSet;
use crate::core::features::FeatureSource;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "contact-sensor-agent";

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// Detector and version state for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    pub kind: DeviceKind,
    pub id: String,
    pub tps: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Detected self-penetrator length in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_length: Option<f64>,
    /// Detected length of other penetrators in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub others_length: Option<f64>,
}

impl DeviceReport {
    pub fn from_device(device: &Device) -> Self {
        Self {
            kind: device.kind(),
            id: device.id().to_string(),
            tps: device.is_tps(),
            version: device.version(),
            self_length: device.detector(Role::Own).length(),
            others_length: device.detector(Role::Others).length(),
        }
    }
}

/// All device features at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub snapshot_id: String,
    pub producer: SnapshotProducer,
    /// When the snapshot was computed (RFC3339)
    pub computed_at_utc: String,
    pub devices: Vec<DeviceReport>,
    pub sources: Vec<FeatureSource>,
}

/// Builder for feature snapshots.
pub struct SnapshotBuilder {
    instance_id: Uuid,
}

impl SnapshotBuilder {
    /// Create a builder with a fresh instance id.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
        }
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a snapshot of every device in the set.
    pub fn build(&self, devices: &DeviceSet) -> FeatureSnapshot {
        FeatureSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            producer: SnapshotProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: self.instance_id.to_string(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            devices: devices.iter().map(DeviceReport::from_device).collect(),
            sources: devices.sources(),
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
