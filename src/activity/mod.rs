//! Activity module for the Contact Sensor Agent.
//!
//! Tracks how inbound updates were handled so the CLI can report it.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ActivityLog, ActivityStats, SharedActivityLog};
