//! Reference sample schema.
//!
//! Mirrors the layout of `assets/reference_corpus.json`. Every fingerprint
//! stores the same [`AcousticDescriptor`] shape the feature extractor
//! produces, so query and reference are compared field by field.

use crate::analysis::features::{AcousticDescriptor, COEFFICIENT_COUNT};
use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// Recording quality as judged when the sample was curated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Who recorded the sample and how it sounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub age: u32,
    pub gender: Gender,
    pub location: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub audio_quality: AudioQuality,
}

/// Cough character a fingerprint was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintKind {
    Deep,
    Shallow,
    Wet,
    Dry,
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FingerprintKind::Deep => "deep",
            FingerprintKind::Shallow => "shallow",
            FingerprintKind::Wet => "wet",
            FingerprintKind::Dry => "dry",
        };
        f.write_str(name)
    }
}

/// One stored acoustic descriptor of a reference sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoughFingerprint {
    pub kind: FingerprintKind,
    pub descriptor: AcousticDescriptor,
}

/// Curated recording with a known condition label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSample {
    pub id: String,
    pub label: String,
    pub metadata: SampleMetadata,
    pub fingerprints: Vec<CoughFingerprint>,
}

impl ReferenceSample {
    pub(crate) fn validate(&self) -> Result<(), CorpusError> {
        if self.id.trim().is_empty() {
            return Err(CorpusError::invalid("sample id cannot be empty"));
        }
        if self.label.trim().is_empty() {
            return Err(CorpusError::invalid(format!(
                "sample {} has an empty label",
                self.id
            )));
        }
        if self.fingerprints.is_empty() {
            return Err(CorpusError::invalid(format!(
                "sample {} must carry at least one fingerprint",
                self.id
            )));
        }

        for fingerprint in &self.fingerprints {
            let d = &fingerprint.descriptor;
            if d.coefficients.len() != COEFFICIENT_COUNT {
                return Err(CorpusError::invalid(format!(
                    "sample {} ({} fingerprint) has {} coefficients, expected {}",
                    self.id,
                    fingerprint.kind,
                    d.coefficients.len(),
                    COEFFICIENT_COUNT
                )));
            }

            let scalars = [
                d.duration_secs,
                d.rms_energy,
                d.zero_crossing_rate,
                d.spectral_centroid,
                d.pitch_variation,
                d.harmonic_ratio,
            ];
            let finite = scalars
                .iter()
                .chain(d.coefficients.iter())
                .all(|value| value.is_finite());
            if !finite {
                return Err(CorpusError::invalid(format!(
                    "sample {} ({} fingerprint) contains non-finite values",
                    self.id, fingerprint.kind
                )));
            }
            if scalars[..4].iter().any(|&value| value < 0.0) {
                return Err(CorpusError::invalid(format!(
                    "sample {} ({} fingerprint) contains negative measurements",
                    self.id, fingerprint.kind
                )));
            }
        }

        Ok(())
    }
}
