//! Reference corpus of labeled cough fingerprints.
//!
//! The curated corpus ships inside the binary (`assets/reference_corpus.json`)
//! and is parsed once at startup. After construction it is read-only and is
//! meant to be shared between analyzers through an `Arc`.

mod types;

pub use types::{
    AudioQuality, CoughFingerprint, FingerprintKind, Gender, ReferenceSample, SampleMetadata,
};

use crate::error::{log_corpus_error, CorpusError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Built-in curated corpus
const BUNDLED_CORPUS: &str = include_str!("../../assets/reference_corpus.json");

/// Ordered, immutable collection of reference samples
///
/// `Default` is the empty corpus; classifying against it yields
/// `AnalysisError::ModelNotLoaded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCorpus {
    version: u32,
    samples: Vec<ReferenceSample>,
}

impl ReferenceCorpus {
    /// Parse the built-in corpus
    ///
    /// Every call returns an equal corpus.
    pub fn load() -> Result<Self, CorpusError> {
        Self::from_json(BUNDLED_CORPUS).inspect_err(|err| log_corpus_error(err, "load"))
    }

    /// Parse and validate corpus JSON
    pub fn from_json(data: &str) -> Result<Self, CorpusError> {
        let corpus: ReferenceCorpus = serde_json::from_str(data)?;
        corpus.validate()?;
        log::debug!(
            "Reference corpus v{} parsed: {} samples, {} labels",
            corpus.version,
            corpus.len(),
            corpus.labels().len()
        );
        Ok(corpus)
    }

    /// Read a corpus from disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| CorpusError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&contents).inspect_err(|err| {
            log_corpus_error(err, &format!("load_from_file({})", path.display()))
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// All samples in corpus order
    pub fn all(&self) -> &[ReferenceSample] {
        &self.samples
    }

    /// Distinct labels in order of first appearance
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.samples
            .iter()
            .map(|sample| sample.label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Sample by id
    pub fn get(&self, id: &str) -> Option<&ReferenceSample> {
        self.samples.iter().find(|sample| sample.id == id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn validate(&self) -> Result<(), CorpusError> {
        if self.version == 0 {
            return Err(CorpusError::invalid("corpus version must be > 0"));
        }
        if self.samples.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut seen = HashSet::new();
        for sample in &self.samples {
            if !seen.insert(sample.id.as_str()) {
                return Err(CorpusError::invalid(format!(
                    "duplicate sample id detected: {}",
                    sample.id
                )));
            }
            sample.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CorpusErrorCodes, ErrorCode};

    fn sample_json(id: &str, label: &str, coefficients: usize) -> String {
        let coefficients = vec!["0.1"; coefficients].join(", ");
        format!(
            r#"{{
                "id": "{id}",
                "label": "{label}",
                "metadata": {{
                    "age": 30, "gender": "male", "location": "Test",
                    "symptoms": [], "audio_quality": "good"
                }},
                "fingerprints": [{{
                    "kind": "deep",
                    "descriptor": {{
                        "duration_secs": 1.0, "rms_energy": 0.1,
                        "zero_crossing_rate": 0.1, "spectral_centroid": 1500.0,
                        "pitch_variation": 0.3, "harmonic_ratio": 0.5,
                        "coefficients": [{coefficients}]
                    }}
                }}]
            }}"#
        )
    }

    fn corpus_json(samples: &[String]) -> String {
        format!(r#"{{ "version": 1, "samples": [{}] }}"#, samples.join(","))
    }

    #[test]
    fn test_bundled_corpus_loads() {
        let corpus = ReferenceCorpus::load().unwrap();
        assert_eq!(corpus.len(), 12);
        assert_eq!(
            corpus.labels(),
            vec!["Healthy", "Asthma", "Bronchitis", "Pneumonia", "COVID-19", "Common Cold"]
        );
        assert_eq!(corpus.all()[0].id, "healthy_pattern_1");
    }

    #[test]
    fn test_load_is_idempotent() {
        assert_eq!(ReferenceCorpus::load().unwrap(), ReferenceCorpus::load().unwrap());
    }

    #[test]
    fn test_get_by_id() {
        let corpus = ReferenceCorpus::load().unwrap();
        let sample = corpus.get("asthma_pattern_1").unwrap();
        assert_eq!(sample.label, "Asthma");
        assert_eq!(sample.metadata.gender, Gender::Female);
        assert_eq!(sample.fingerprints[0].kind, FingerprintKind::Deep);
        assert!(corpus.get("missing").is_none());
    }

    #[test]
    fn test_default_is_empty() {
        let corpus = ReferenceCorpus::default();
        assert!(corpus.is_empty());
        assert!(corpus.labels().is_empty());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = corpus_json(&[sample_json("a", "X", 13), sample_json("a", "Y", 13)]);
        let err = ReferenceCorpus::from_json(&json).unwrap_err();
        assert_eq!(err.code(), CorpusErrorCodes::INVALID);
    }

    #[test]
    fn test_rejects_wrong_coefficient_count() {
        let json = corpus_json(&[sample_json("a", "X", 12)]);
        assert!(matches!(
            ReferenceCorpus::from_json(&json),
            Err(CorpusError::Invalid { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_label() {
        let json = corpus_json(&[sample_json("a", " ", 13)]);
        assert!(ReferenceCorpus::from_json(&json).is_err());
    }

    #[test]
    fn test_rejects_empty_corpus() {
        let err = ReferenceCorpus::from_json(r#"{ "version": 1, "samples": [] }"#).unwrap_err();
        assert_eq!(err, CorpusError::Empty);
    }

    #[test]
    fn test_parse_error() {
        let err = ReferenceCorpus::from_json("{ not json").unwrap_err();
        assert_eq!(err.code(), CorpusErrorCodes::PARSE);
    }

    #[test]
    fn test_missing_file() {
        let err = ReferenceCorpus::load_from_file("/nonexistent/corpus.json").unwrap_err();
        assert_eq!(err.code(), CorpusErrorCodes::IO);
    }
}
