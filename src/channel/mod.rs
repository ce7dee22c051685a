//! Channel module for the Contact Sensor Agent.
//!
//! Channels hold the latest value received for each avatar parameter. The
//! transport that fills them lives outside this crate; the replay reader here
//! stands in for it.

pub mod types;

// Re-export commonly used types
pub use types::{ChannelUpdate, OscValue, ValueChannel};
