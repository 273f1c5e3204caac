// Similarity - weighted comparison of a query descriptor with reference samples
//
// Each component is a linear falloff `max(0, 1 - |a - b| / scale)` (Euclidean
// distance for the coefficient sequence), combined with the configured
// weights. A reference sample is represented by its best-matching fingerprint.

use serde::{Deserialize, Serialize};

use crate::analysis::features::AcousticDescriptor;
use crate::config::SimilarityConfig;
use crate::corpus::{FingerprintKind, ReferenceCorpus, ReferenceSample};

/// Per-component similarity breakdown (each 0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSimilarity {
    pub coefficient: f32,
    pub spectral: f32,
    pub energy: f32,
    pub duration: f32,
    pub zero_crossing: f32,
}

/// Outcome of scoring one query against one reference sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    pub sample_id: String,
    pub label: String,
    /// Weighted overall similarity (0.0 to 1.0)
    pub similarity: f32,
    pub components: ComponentSimilarity,
    /// Fingerprint of the reference sample that matched best
    pub fingerprint: FingerprintKind,
}

/// Scores descriptors with the configured weights and scales
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    config: SimilarityConfig,
}

impl SimilarityScorer {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Score `query` against every fingerprint of `reference`, keeping the best
    ///
    /// Ties keep the earlier fingerprint. A sample without fingerprints scores 0.
    pub fn score(&self, query: &AcousticDescriptor, reference: &ReferenceSample) -> SimilarityResult {
        let mut best: Option<(f32, ComponentSimilarity, FingerprintKind)> = None;
        for fingerprint in &reference.fingerprints {
            let (similarity, components) = self.compare(query, &fingerprint.descriptor);
            if best.map_or(true, |(current, _, _)| similarity > current) {
                best = Some((similarity, components, fingerprint.kind));
            }
        }

        let (similarity, components, fingerprint) = best.unwrap_or((
            0.0,
            ComponentSimilarity::default(),
            FingerprintKind::Deep,
        ));

        SimilarityResult {
            sample_id: reference.id.clone(),
            label: reference.label.clone(),
            similarity,
            components,
            fingerprint,
        }
    }

    /// Score `query` against every sample, in corpus order
    pub fn score_all(
        &self,
        query: &AcousticDescriptor,
        corpus: &ReferenceCorpus,
    ) -> Vec<SimilarityResult> {
        corpus
            .all()
            .iter()
            .map(|sample| self.score(query, sample))
            .collect()
    }

    /// Compare two descriptors
    ///
    /// # Returns
    /// Tuple of (overall similarity 0.0-1.0, component breakdown)
    pub fn compare(
        &self,
        query: &AcousticDescriptor,
        reference: &AcousticDescriptor,
    ) -> (f32, ComponentSimilarity) {
        let scales = &self.config.scales;
        let weights = &self.config.weights;

        let components = ComponentSimilarity {
            coefficient: coefficient_similarity(
                &query.coefficients,
                &reference.coefficients,
                scales.coefficient_distance,
            ),
            spectral: falloff(
                query.spectral_centroid,
                reference.spectral_centroid,
                scales.centroid_hz,
            ),
            energy: falloff(query.rms_energy, reference.rms_energy, scales.energy),
            duration: falloff(
                query.duration_secs,
                reference.duration_secs,
                scales.duration_secs,
            ),
            zero_crossing: falloff(
                query.zero_crossing_rate,
                reference.zero_crossing_rate,
                scales.zero_crossing,
            ),
        };

        let overall = weights.coefficient * components.coefficient
            + weights.spectral * components.spectral
            + weights.zero_crossing * components.zero_crossing
            + weights.energy * components.energy
            + weights.duration * components.duration;

        let overall = if overall.is_finite() {
            overall.clamp(0.0, 1.0)
        } else {
            0.0
        };
        (overall, components)
    }
}

/// `max(0, 1 - |a - b| / scale)`, 0 for non-finite input or a non-positive scale
fn falloff(a: f32, b: f32, scale: f32) -> f32 {
    if scale <= 0.0 {
        return 0.0;
    }
    let value = 1.0 - (a - b).abs() / scale;
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Euclidean distance falloff; sequences of different length score 0
fn coefficient_similarity(a: &[f32], b: &[f32], scale: f32) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let distance = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt();
    falloff(distance, 0.0, scale)
}
