//! Core functionality for the Contact Sensor Agent.
//!
//! This module contains:
//! - Length detection from noisy root/tip proximity readings
//! - Per-device channel state and feature derivation
//! - The set of known devices and snapshot building for export

pub mod device;
pub mod device_set;
pub mod features;
pub mod length;
pub mod snapshot;

// Re-export commonly used types
pub use device::{parse_version_key, ChannelKey, Device, DeviceKind, Role};
pub use device_set::{ApplyResult, DeviceSet};
pub use features::FeatureSource;
pub use length::{consensus_length, IgnoreReason, LengthDetector, SampleOutcome};
pub use snapshot::{DeviceReport, FeatureSnapshot, SnapshotBuilder, PRODUCER_NAME};
