use std::sync::Arc;

use cough_analyzer::analysis::classifier::Classifier;
use cough_analyzer::analysis::clock::FixedClock;
use cough_analyzer::corpus::FingerprintKind;
use cough_analyzer::{AnalysisError, AppConfig, CorpusError, ErrorCode, ReferenceCorpus};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("cough_corpus_{}_{}.json", name, std::process::id()))
}

#[test]
fn corpus_round_trips_through_a_file() {
    let corpus = ReferenceCorpus::load().unwrap();
    let path = temp_path("roundtrip");
    std::fs::write(&path, serde_json::to_string_pretty(&corpus).unwrap()).unwrap();

    let reloaded = ReferenceCorpus::load_from_file(&path).unwrap();
    assert_eq!(reloaded, corpus);
    assert_eq!(reloaded.version(), 1);
}

#[test]
fn every_sample_has_a_deep_fingerprint() {
    let corpus = ReferenceCorpus::load().unwrap();
    for sample in corpus.all() {
        assert!(
            sample
                .fingerprints
                .iter()
                .any(|f| f.kind == FingerprintKind::Deep),
            "{} has no deep fingerprint",
            sample.id
        );
        assert_eq!(sample.fingerprints[0].descriptor.coefficients.len(), 13);
    }
}

#[test]
fn invalid_corpus_file_reports_code() {
    let path = temp_path("invalid");
    std::fs::write(&path, r#"{"version": 1, "samples": [{"id": "x"}]}"#).unwrap();
    let err = ReferenceCorpus::load_from_file(&path).unwrap_err();
    assert!(matches!(err, CorpusError::Parse { .. }));
    assert_eq!(err.code(), 4002);
}

#[test]
fn healthy_reference_scenario() {
    let corpus = Arc::new(ReferenceCorpus::load().unwrap());
    let config = AppConfig::default();
    let classifier = Classifier::new(config.similarity, config.classifier)
        .with_clock(Arc::new(FixedClock(0)));
    let query = &corpus.get("healthy_pattern_1").unwrap().fingerprints[0].descriptor;

    let result = classifier.classify(query, &corpus).unwrap();
    assert_eq!(result.dominant_condition, "Healthy");
    assert!((result.top_matches[0].similarity - 1.0).abs() < 1e-5);
    assert!((result.total_probability() - 100.0).abs() < 0.01);
}

#[test]
fn empty_corpus_cannot_classify() {
    let config = AppConfig::default();
    let classifier = Classifier::new(config.similarity, config.classifier);
    let query = ReferenceCorpus::load().unwrap().all()[0].fingerprints[0]
        .descriptor
        .clone();
    assert_eq!(
        classifier.classify(&query, &ReferenceCorpus::default()),
        Err(AnalysisError::ModelNotLoaded)
    );
}
