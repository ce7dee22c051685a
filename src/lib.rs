//! Contact Sensor Agent - length detection and contact features for avatar sensors.
//!
//! Avatars expose proximity readings for receivers (`Orf`) and insertables
//! (`Pen`) as named parameters. This library turns those readings into a
//! normalized 0-1 feature list per device, including a penetration depth
//! that relies on a noise-tolerant estimate of the penetrator's length.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Contact Sensor Agent                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Replay    │──▶│   Device    │──▶│  Features   │       │
//! │  │  (reader)   │   │ (channels)  │   │ (on demand) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                 │                  │              │
//! │         ▼                 ▼                  ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Activity   │   │   Length    │   │  Snapshot   │       │
//! │  │    Log      │   │  Detector   │   │  (export)   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use contact_sensor_agent::channel::{OscValue, ValueChannel};
//! use contact_sensor_agent::core::{Device, DeviceKind, Role};
//!
//! let mut device = Device::new(DeviceKind::Orf, "mouth", false);
//! device.add_key("PenOthersNewRoot", ValueChannel::new());
//! device.add_key("PenOthersNewTip", ValueChannel::new());
//! device.set_value("PenOthersNewRoot", Some(OscValue::Number(0.1)));
//! for tip in [0.50, 0.49, 0.50, 0.49, 0.50] {
//!     device.set_value("PenOthersNewTip", Some(OscValue::Number(tip)));
//! }
//! assert!(device.detector(Role::Others).length().is_some());
//! ```

pub mod activity;
pub mod channel;
pub mod config;
pub mod core;
pub mod replay;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use channel::{ChannelUpdate, OscValue, ValueChannel};
pub use config::{Config, ConfigError, OutputFormat};
pub use core::{
    ChannelKey, Device, DeviceKind, DeviceSet, FeatureSnapshot, FeatureSource, LengthDetector,
    Role, SampleOutcome, SnapshotBuilder,
};
pub use replay::{InputSource, ReplayError, ReplayEvent, Replayer, UpdateReader};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialise tracing with `RUST_LOG` taking precedence over `default_filter`.
pub fn init_logging(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
