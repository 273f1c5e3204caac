// Types module - Data structures for cough features
//
// This module defines the feature descriptors that flow from the extractor
// to the cough gate and the similarity scorer.

use serde::{Deserialize, Serialize};

/// Canonical length of every feature vector
pub const CANONICAL_FEATURE_LEN: usize = 1024;

/// Canonical number of cepstral coefficients
pub const COEFFICIENT_COUNT: usize = 13;

/// Scalar acoustic summary of one recording
///
/// This is the part of a [`FeatureVector`] the similarity scorer compares,
/// and the shape reference fingerprints are stored in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticDescriptor {
    /// Recording length in seconds
    pub duration_secs: f32,

    /// Root-mean-square amplitude of the whole recording
    pub rms_energy: f32,

    /// Zero-crossing rate (0.0 to 1.0, fraction of adjacent pairs changing sign)
    pub zero_crossing_rate: f32,

    /// Spectral centroid in Hz (energy-weighted mean frequency)
    pub spectral_centroid: f32,

    /// Heuristic pitch instability estimate (0.0 to 1.0)
    ///
    /// Approximation from centroid and ZCR, not a measured pitch track.
    pub pitch_variation: f32,

    /// Heuristic tonal-vs-noisy estimate (0.0 to 1.0)
    ///
    /// Approximation from centroid and ZCR, not a harmonic analysis.
    pub harmonic_ratio: f32,

    /// Cepstral coefficients of the log-mel envelope
    pub coefficients: Vec<f32>,
}

/// Fixed-length feature descriptor derived from one audio buffer
///
/// `values` holds the per-band statistics grouped by statistic
/// (`[means | stds | mins | maxs]`, `mel_bands` values each) followed by
/// zero padding. Its length never depends on the input duration.
///
/// The statistics are pooled over the whole fixed time axis, silent padding
/// frames included. `active_frames` out of `frame_count` records how much of
/// that axis came from the signal; 0 out of 0 means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f32>,
    mel_bands: usize,
    #[serde(default)]
    active_frames: usize,
    #[serde(default)]
    frame_count: usize,
    descriptor: AcousticDescriptor,
}

impl FeatureVector {
    /// Build a vector of exactly `len` values, zero-padding or truncating `values`
    pub fn new(
        mut values: Vec<f32>,
        len: usize,
        mel_bands: usize,
        descriptor: AcousticDescriptor,
    ) -> Self {
        values.resize(len, 0.0);
        Self {
            values,
            mel_bands,
            active_frames: 0,
            frame_count: 0,
            descriptor,
        }
    }

    /// Record the time-axis occupancy the statistics were pooled over
    pub fn with_time_axis(mut self, active_frames: usize, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self.active_frames = active_frames.min(frame_count);
        self
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mel_bands(&self) -> usize {
        self.mel_bands
    }

    pub fn descriptor(&self) -> &AcousticDescriptor {
        &self.descriptor
    }

    /// Time-axis frames that came from the signal
    pub fn active_frames(&self) -> usize {
        self.active_frames
    }

    /// Length of the fixed time axis, 0 when unknown
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of trailing silent frames included in the statistics
    pub fn padding_frames(&self) -> usize {
        self.frame_count.saturating_sub(self.active_frames)
    }

    /// Statistics region (without trailing padding)
    pub fn statistics(&self) -> &[f32] {
        let end = (4 * self.mel_bands).min(self.values.len());
        &self.values[..end]
    }

    /// One statistic block: 0 = mean, 1 = std, 2 = min, 3 = max
    ///
    /// Returns an empty slice when the block was truncated away.
    pub fn block(&self, index: usize) -> &[f32] {
        let stats = self.statistics();
        let start = (index * self.mel_bands).min(stats.len());
        let end = ((index + 1) * self.mel_bands).min(stats.len());
        &stats[start..end]
    }
}
