//! Activity log for channel processing.
//!
//! Counts what the agent did with inbound updates. Only counters are kept;
//! no sample history is stored here.

use crate::core::{ApplyResult, SampleOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Processing statistics for the current session.
#[derive(Debug)]
pub struct ActivityLog {
    /// Number of channel updates received
    updates_received: AtomicU64,
    /// Number of input lines that could not be parsed
    malformed_lines: AtomicU64,
    /// Number of updates for unknown device kinds
    unknown_devices: AtomicU64,
    /// Number of length samples pushed onto a history
    samples_recorded: AtomicU64,
    /// Number of detector resets
    detector_resets: AtomicU64,
    /// Number of implausible samples ignored
    samples_ignored: AtomicU64,
    /// Number of times a fallback length grew
    fallback_updates: AtomicU64,
    /// Number of snapshots exported
    snapshots_exported: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl ActivityLog {
    /// Create a new activity log.
    pub fn new() -> Self {
        Self {
            updates_received: AtomicU64::new(0),
            malformed_lines: AtomicU64::new(0),
            unknown_devices: AtomicU64::new(0),
            samples_recorded: AtomicU64::new(0),
            detector_resets: AtomicU64::new(0),
            samples_ignored: AtomicU64::new(0),
            fallback_updates: AtomicU64::new(0),
            snapshots_exported: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record a received update.
    pub fn record_update(&self) {
        self.updates_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an input line that failed to parse.
    pub fn record_malformed_line(&self) {
        self.malformed_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of applying an update to the device set.
    pub fn record_apply(&self, result: ApplyResult) {
        match result {
            ApplyResult::UnknownDevice => {
                self.unknown_devices.fetch_add(1, Ordering::Relaxed);
            }
            ApplyResult::Applied(Some(outcome)) => self.record_outcome(outcome),
            ApplyResult::Applied(None) => {}
        }
    }

    /// Record what a length detector did with a sample.
    pub fn record_outcome(&self, outcome: SampleOutcome) {
        let counter = match outcome {
            SampleOutcome::Cleared => &self.detector_resets,
            SampleOutcome::Ignored(_) => &self.samples_ignored,
            SampleOutcome::Penetrating {
                fallback_updated: true,
            } => &self.fallback_updates,
            SampleOutcome::Penetrating {
                fallback_updated: false,
            } => return,
            SampleOutcome::Recorded(_) => &self.samples_recorded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an exported snapshot.
    pub fn record_snapshot_exported(&self) {
        self.snapshots_exported.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            updates_received: self.updates_received.load(Ordering::Relaxed),
            malformed_lines: self.malformed_lines.load(Ordering::Relaxed),
            unknown_devices: self.unknown_devices.load(Ordering::Relaxed),
            samples_recorded: self.samples_recorded.load(Ordering::Relaxed),
            detector_resets: self.detector_resets.load(Ordering::Relaxed),
            samples_ignored: self.samples_ignored.load(Ordering::Relaxed),
            fallback_updates: self.fallback_updates.load(Ordering::Relaxed),
            snapshots_exported: self.snapshots_exported.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Channel updates received: {}\n\
             - Malformed input lines: {}\n\
             - Updates for unknown devices: {}\n\
             - Length samples recorded: {}\n\
             - Length samples ignored: {}\n\
             - Detector resets: {}\n\
             - Fallback length updates: {}\n\
             - Snapshots exported: {}\n\
             - Session duration: {} seconds",
            stats.updates_received,
            stats.malformed_lines,
            stats.unknown_devices,
            stats.samples_recorded,
            stats.samples_ignored,
            stats.detector_resets,
            stats.fallback_updates,
            stats.snapshots_exported,
            stats.session_duration_secs
        )
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub updates_received: u64,
    pub malformed_lines: u64,
    pub unknown_devices: u64,
    pub samples_recorded: u64,
    pub detector_resets: u64,
    pub samples_ignored: u64,
    pub fallback_updates: u64,
    pub snapshots_exported: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log.
pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IgnoreReason;

    #[test]
    fn test_activity_log_counting() {
        let log = ActivityLog::new();

        log.record_update();
        log.record_update();
        log.record_apply(ApplyResult::Applied(Some(SampleOutcome::Recorded(0.4))));
        log.record_apply(ApplyResult::Applied(Some(SampleOutcome::Cleared)));
        log.record_apply(ApplyResult::Applied(None));
        log.record_apply(ApplyResult::UnknownDevice);
        log.record_outcome(SampleOutcome::Ignored(IgnoreReason::TooShort));
        log.record_outcome(SampleOutcome::Penetrating {
            fallback_updated: true,
        });
        log.record_outcome(SampleOutcome::Penetrating {
            fallback_updated: false,
        });

        let stats = log.stats();
        assert_eq!(stats.updates_received, 2);
        assert_eq!(stats.samples_recorded, 1);
        assert_eq!(stats.detector_resets, 1);
        assert_eq!(stats.unknown_devices, 1);
        assert_eq!(stats.samples_ignored, 1);
        assert_eq!(stats.fallback_updates, 1);
    }

    #[test]
    fn test_summary_format() {
        let log = ActivityLog::new();
        let summary = log.summary();

        assert!(summary.contains("Channel updates received"));
        assert!(summary.contains("Detector resets"));
    }
}
