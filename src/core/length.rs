//! Penetrator length detection from root and tip proximity.
//!
//! The receiver spheres are 1m in size, so the difference between the tip and
//! root proximity readings is the penetrator length in meters. The two
//! readings update at unrelated times, which means many recorded lengths mix a
//! stale value with a fresh one. The true length shows up repeatedly across
//! sampling windows while the artifacts are scattered, so the estimate is the
//! tightest pair of samples in the recent history.

use serde::Serialize;

/// Number of recent samples kept for the consensus estimate.
pub const MAX_SAMPLES: usize = 8;

/// Samples needed before the history is trusted over the fallback.
pub const MIN_SAMPLES: usize = 4;

/// Below this proximity, nobody is in range of the sphere.
const PRESENCE_THRESHOLD: f64 = 0.01;

/// Above this root proximity the reading is degenerate.
const ROOT_CENTER_THRESHOLD: f64 = 0.95;

/// Shortest length considered plausible.
const MIN_LENGTH: f64 = 0.02;

/// Tip proximity at which the penetrator counts as fully inserted.
pub const PENETRATING_THRESHOLD: f64 = 0.99;

/// Why an update was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The root collider sits in the center of the receiver
    RootAtCenter,
    /// The length was too short (broken or backward)
    TooShort,
}

/// What an update did to the detector state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleOutcome {
    /// Missing data or nobody in range; history and fallback were cleared
    Cleared,
    /// The reading was implausible and prior state was kept
    Ignored(IgnoreReason),
    /// Fully inserted; the length was only considered as a fallback
    Penetrating { fallback_updated: bool },
    /// The length was pushed onto the history
    Recorded(f64),
}

/// Detects the length of a penetrator from its root and tip proximity.
#[derive(Debug, Clone, Default)]
pub struct LengthDetector {
    /// Current best estimate
    length: Option<f64>,
    /// Recent reliable samples, most recent first
    recent_samples: Vec<f64>,
    /// Largest length seen while fully inserted
    penetrating_sample: Option<f64>,
}

impl LengthDetector {
    /// Create an empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length estimate in meters.
    pub fn length(&self) -> Option<f64> {
        self.length
    }

    /// Recent samples, most recent first.
    pub fn samples(&self) -> &[f64] {
        &self.recent_samples
    }

    /// Length inferred while fully inserted, used when history is too short.
    pub fn fallback(&self) -> Option<f64> {
        self.penetrating_sample
    }

    /// Feed the latest root and tip proximity readings.
    pub fn update(&mut self, root_prox: Option<f64>, tip_prox: Option<f64>) -> SampleOutcome {
        let (root_prox, tip_prox) = match (root_prox, tip_prox) {
            (Some(root), Some(tip)) => (root, tip),
            _ => {
                tracing::debug!("Length detector reset: missing root or tip");
                return self.clear();
            }
        };

        if root_prox < PRESENCE_THRESHOLD || tip_prox < PRESENCE_THRESHOLD {
            tracing::debug!("Length detector reset: nobody in range");
            return self.clear();
        }

        if root_prox > ROOT_CENTER_THRESHOLD {
            tracing::debug!(root_prox, "Ignoring sample with root at center");
            return SampleOutcome::Ignored(IgnoreReason::RootAtCenter);
        }

        let length = tip_prox - root_prox;
        if length < MIN_LENGTH {
            tracing::debug!(length, "Ignoring sample that is too short");
            return SampleOutcome::Ignored(IgnoreReason::TooShort);
        }

        if tip_prox > PENETRATING_THRESHOLD {
            // The tip is inside, so this only bounds the length from below.
            let fallback_updated = match self.penetrating_sample {
                Some(previous) => length > previous,
                None => true,
            };
            if fallback_updated {
                self.penetrating_sample = Some(length);
                self.recompute();
            }
            return SampleOutcome::Penetrating { fallback_updated };
        }

        self.recent_samples.insert(0, length);
        self.recent_samples.truncate(MAX_SAMPLES);
        self.recompute();
        tracing::trace!(length, samples = self.recent_samples.len(), "Recorded length sample");
        SampleOutcome::Recorded(length)
    }

    fn clear(&mut self) -> SampleOutcome {
        self.penetrating_sample = None;
        self.recent_samples.clear();
        self.recompute();
        SampleOutcome::Cleared
    }

    fn recompute(&mut self) {
        self.length = consensus_length(&self.recent_samples).or(self.penetrating_sample);
    }
}

/// Pick the consensus length from a sample history.
///
/// Returns `None` when there are fewer than [`MIN_SAMPLES`] samples. Otherwise
/// the samples are sorted and the upper member of the closest adjacent pair
/// wins; ties keep the lowest pair.
pub fn consensus_length(samples: &[f64]) -> Option<f64> {
    if samples.len() < MIN_SAMPLES {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut smallest_diff = 1.0;
    let mut smallest_diff_index = None;
    for i in 1..sorted.len() {
        let diff = (sorted[i] - sorted[i - 1]).abs();
        if diff < smallest_diff {
            smallest_diff = diff;
            smallest_diff_index = Some(i);
        }
    }

    match smallest_diff_index {
        Some(i) => Some(sorted[i]),
        None => samples.first().copied(),
    }
}
