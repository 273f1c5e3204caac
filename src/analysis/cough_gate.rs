// Cough gate - decides whether a feature vector looks like a cough at all
//
// The statistics region pools the whole fixed time axis, so a recording
// shorter than that axis carries trailing silent frames in every moment.
// The heuristic gate first subtracts those frames back out of the per-band
// mean and std (the padding value is the floor of the min block), then reads
// three properties of the signal frames alone:
// - temporal variance: energy-weighted mean of the per-band std over time
// - spectral flatness: 1 - spread of the band means across bands
// - band ratio: |mean(low-quarter means) - mean(high-quarter means)|, a log ratio
//
// Each is divided by its configured scale and capped at 1, then combined with
// the configured weights. A stationary sound (steady tone, hum, hiss) has
// almost no temporal variance and stays below the threshold at any length.

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::config::CoughGateConfig;

/// Which detector produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Heuristic,
    Svm,
}

/// Outcome of cough detection for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoughDecision {
    pub is_cough: bool,
    /// Detector confidence that the input is a cough (0.0 to 1.0)
    pub confidence: f32,
    /// Raw detector output (weighted heuristic score or SVM decision value)
    pub score: f32,
    pub detector: DetectorKind,
}

/// Binary cough / not-cough detector
pub trait CoughDetector: Send + Sync {
    fn evaluate(&self, features: &FeatureVector) -> CoughDecision;

    fn is_cough(&self, features: &FeatureVector) -> bool {
        self.evaluate(features).is_cough
    }
}

/// Sub-scores of the heuristic gate, each 0.0 to 1.0 before weighting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GateComponents {
    pub temporal_variance: f32,
    pub spectral_flatness: f32,
    pub band_ratio: f32,
}

/// Below this log-energy range the spectrogram is treated as silent
const SILENT_RANGE: f32 = 1e-3;

/// Statistics-based cough gate
#[derive(Debug, Clone)]
pub struct CoughGate {
    config: CoughGateConfig,
}

impl CoughGate {
    pub fn new(config: CoughGateConfig) -> Self {
        Self { config }
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// Compute the three bounded sub-scores of `features`
    ///
    /// Silent or constant input (no log-energy range at all) scores zero on
    /// every component.
    pub fn components(&self, features: &FeatureVector) -> GateComponents {
        let Some((means, stds)) = signal_moments(features) else {
            return GateComponents::default();
        };

        // Loud bands dominate; bands sitting near the floor only add noise
        let top = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (weighted, total) = means
            .iter()
            .zip(&stds)
            .fold((0.0, 0.0), |(weighted, total), (&m, &s)| {
                let w = (m - top).exp();
                (weighted + w * s, total + w)
            });
        let temporal = if total > 0.0 { weighted / total } else { 0.0 };

        let spread = std_dev(&means);
        let quarter = (means.len() / 4).max(1);
        let low = mean(&means[..quarter]);
        let high = mean(&means[means.len() - quarter..]);

        GateComponents {
            temporal_variance: bounded(temporal as f32, self.config.temporal_variance_scale),
            spectral_flatness: if spread.is_finite() {
                1.0 - bounded(spread as f32, self.config.band_spread_scale)
            } else {
                0.0
            },
            band_ratio: bounded((low - high).abs() as f32, self.config.band_ratio_scale),
        }
    }

    /// Weighted sum of the sub-scores
    pub fn score(&self, features: &FeatureVector) -> f32 {
        let c = self.components(features);
        let w = &self.config.weights;
        let score = w.temporal_variance * c.temporal_variance
            + w.spectral_flatness * c.spectral_flatness
            + w.band_ratio * c.band_ratio;
        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Per-band mean and std of the log energies over the signal frames only
///
/// Padding frames all sit at the compression floor, which is the smallest
/// value of the min block whenever padding exists. With `p` padding frames
/// at floor `f` out of `n`, the signal frames' sums are `n * mean - p * f`
/// and `n * (std² + mean²) - p * f²`.
///
/// Returns `None` when there is nothing to score: no statistics, no signal
/// frames, or a spectrogram without any log-energy range.
fn signal_moments(features: &FeatureVector) -> Option<(Vec<f64>, Vec<f64>)> {
    let means = features.block(0);
    let stds = features.block(1);
    let bands = means.len().min(stds.len());
    if bands == 0 || (features.frame_count() > 0 && features.active_frames() == 0) {
        return None;
    }

    let floor = features.block(2).iter().copied().fold(f32::INFINITY, f32::min);
    let peak = features.block(3).iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = peak - floor;
    if !range.is_finite() || range < SILENT_RANGE {
        return None;
    }

    let padding = features.padding_frames();
    if padding == 0 {
        return Some((
            means[..bands].iter().map(|&m| m as f64).collect(),
            stds[..bands].iter().map(|&s| s as f64).collect(),
        ));
    }

    let n = features.frame_count() as f64;
    let active = features.active_frames() as f64;
    let pad = padding as f64;
    let floor = floor as f64;

    Some(
        means[..bands]
            .iter()
            .zip(&stds[..bands])
            .map(|(&m, &s)| {
                let (m, s) = (m as f64, s as f64);
                let signal_mean = (n * m - pad * floor) / active;
                let square = (n * (s * s + m * m) - pad * floor * floor) / active;
                let variance = square - signal_mean * signal_mean;
                (signal_mean, variance.max(0.0).sqrt())
            })
            .unzip(),
    )
}

impl CoughDetector for CoughGate {
    fn evaluate(&self, features: &FeatureVector) -> CoughDecision {
        let score = self.score(features);
        CoughDecision {
            is_cough: score >= self.config.threshold,
            confidence: score,
            score,
            detector: DetectorKind::Heuristic,
        }
    }
}

/// `min(1, value / scale)`, 0 for a non-positive scale or non-finite value
fn bounded(value: f32, scale: f32) -> f32 {
    if scale <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / scale).clamp(0.0, 1.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
