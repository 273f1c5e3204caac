//! Configuration management for analyzer parameter tuning
//!
//! This module provides runtime configuration loading from JSON files so the
//! empirical constants of the pipeline (similarity weights, confidence
//! thresholds, cough-gate weights) can be overridden without recompilation.
//! The `Default` impls hold the canonical values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// Tolerance used when checking that a weight set sums to 1.0
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Complete analyzer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub spectral: SpectralConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub cough_gate: CoughGateConfig,
}

/// Audio normalization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Canonical sample rate every buffer is resampled to (Hz)
    pub target_sample_rate: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
        }
    }
}

/// Short-time spectral analysis and feature layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// STFT frame length in samples
    pub frame_size: usize,
    /// Hop between consecutive frames in samples
    pub hop_size: usize,
    /// Number of triangular mel filters
    pub mel_bands: usize,
    /// Fixed number of time frames after padding/truncation
    pub frame_count: usize,
    /// Canonical feature vector length
    pub feature_len: usize,
    /// Number of cepstral coefficients kept for fine-grained similarity
    pub coefficient_count: usize,
    /// Added before log compression to avoid ln(0)
    pub log_epsilon: f32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 256,
            mel_bands: 128,
            frame_count: 128,
            feature_len: 1024,
            coefficient_count: 13,
            log_epsilon: 1e-10,
        }
    }
}

/// Relative weight of each similarity component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub coefficient: f32,
    pub spectral: f32,
    pub zero_crossing: f32,
    pub energy: f32,
    pub duration: f32,
}

impl SimilarityWeights {
    pub fn sum(&self) -> f32 {
        self.coefficient + self.spectral + self.zero_crossing + self.energy + self.duration
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            coefficient: 0.4,
            spectral: 0.2,
            zero_crossing: 0.15,
            energy: 0.15,
            duration: 0.1,
        }
    }
}

/// Distance at which each component similarity reaches zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScales {
    /// Euclidean distance between coefficient sequences
    pub coefficient_distance: f32,
    /// Spectral centroid difference in Hz
    pub centroid_hz: f32,
    /// Zero-crossing rate difference
    pub zero_crossing: f32,
    /// RMS energy difference
    pub energy: f32,
    /// Duration difference in seconds
    pub duration_secs: f32,
}

impl Default for SimilarityScales {
    fn default() -> Self {
        Self {
            coefficient_distance: 10.0,
            centroid_hz: 3000.0,
            zero_crossing: 0.2,
            energy: 0.2,
            duration_secs: 3.0,
        }
    }
}

/// Weighted multi-component similarity parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    #[serde(default)]
    pub weights: SimilarityWeights,
    #[serde(default)]
    pub scales: SimilarityScales,
}

/// Ranking and confidence-bucket parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of best matches aggregated into probabilities
    pub top_k: usize,
    /// Average similarity above which confidence is high
    pub high_confidence: f32,
    /// Average similarity above which confidence is medium
    pub medium_confidence: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            high_confidence: 0.7,
            medium_confidence: 0.4,
        }
    }
}

/// Weights of the heuristic cough score components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoughGateWeights {
    pub temporal_variance: f32,
    pub spectral_flatness: f32,
    pub band_ratio: f32,
}

impl CoughGateWeights {
    pub fn sum(&self) -> f32 {
        self.temporal_variance + self.spectral_flatness + self.band_ratio
    }
}

impl Default for CoughGateWeights {
    fn default() -> Self {
        Self {
            temporal_variance: 0.6,
            spectral_flatness: 0.25,
            band_ratio: 0.15,
        }
    }
}

/// Cough/non-cough pre-filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoughGateConfig {
    /// Disable to always run the classifier
    pub enabled: bool,
    /// Score at or above which the input is treated as a cough
    pub threshold: f32,
    #[serde(default)]
    pub weights: CoughGateWeights,
    /// Energy-weighted per-band log-energy std (over signal frames) that
    /// saturates the temporal component
    pub temporal_variance_scale: f32,
    /// Spread of band mean log-energies at which the spectrum counts as
    /// fully peaked (flatness 0)
    pub band_spread_scale: f32,
    /// Low/high quarter log-energy difference that saturates the ratio component
    pub band_ratio_scale: f32,
    /// Probability assigned to every label when no cough is detected
    pub fallback_probability: f32,
    /// Optional exported SVM model replacing the heuristic score
    #[serde(default)]
    pub svm_model_path: Option<PathBuf>,
}

impl Default for CoughGateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.5,
            weights: CoughGateWeights::default(),
            temporal_variance_scale: 2.0,
            band_spread_scale: 6.0,
            band_ratio_scale: 6.0,
            fallback_probability: 2.0,
            svm_model_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or the defaults when the file is missing or the
    /// JSON is invalid (a warning is logged)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the bundled assets directory
    pub fn load() -> Self {
        Self::load_from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/assets/analyzer_config.json"
        ))
    }

    /// Check the invariants every pipeline stage relies on
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.preprocess.target_sample_rate == 0 {
            return Err(AnalysisError::invalid_config(
                "target_sample_rate must be > 0",
            ));
        }

        let spectral = &self.spectral;
        if spectral.frame_size < 2 || spectral.hop_size == 0 {
            return Err(AnalysisError::invalid_config(
                "frame_size must be >= 2 and hop_size > 0",
            ));
        }
        if spectral.mel_bands < 4 || spectral.frame_count == 0 || spectral.feature_len == 0 {
            return Err(AnalysisError::invalid_config(
                "mel_bands must be >= 4, frame_count and feature_len > 0",
            ));
        }
        if spectral.log_epsilon <= 0.0 {
            return Err(AnalysisError::invalid_config("log_epsilon must be > 0"));
        }

        let weight_sum = self.similarity.weights.sum();
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::invalid_config(format!(
                "similarity weights must sum to 1.0 (got {})",
                weight_sum
            )));
        }
        let scales = &self.similarity.scales;
        if [
            scales.coefficient_distance,
            scales.centroid_hz,
            scales.zero_crossing,
            scales.energy,
            scales.duration_secs,
        ]
        .iter()
        .any(|&scale| scale <= 0.0)
        {
            return Err(AnalysisError::invalid_config(
                "similarity scales must be > 0",
            ));
        }

        let classifier = &self.classifier;
        if classifier.top_k == 0 {
            return Err(AnalysisError::invalid_config("top_k must be >= 1"));
        }
        if classifier.medium_confidence > classifier.high_confidence {
            return Err(AnalysisError::invalid_config(
                "medium_confidence must not exceed high_confidence",
            ));
        }

        let gate = &self.cough_gate;
        let gate_sum = gate.weights.sum();
        if (gate_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::invalid_config(format!(
                "cough gate weights must sum to 1.0 (got {})",
                gate_sum
            )));
        }
        if gate.temporal_variance_scale <= 0.0
            || gate.band_spread_scale <= 0.0
            || gate.band_ratio_scale <= 0.0
        {
            return Err(AnalysisError::invalid_config(
                "cough gate scales must be > 0",
            ));
        }
        if !(0.0..=5.0).contains(&gate.fallback_probability) {
            return Err(AnalysisError::invalid_config(
                "fallback_probability must be within [0, 5]",
            ));
        }

        Ok(())
    }
}
