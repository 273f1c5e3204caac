use super::*;
use crate::analysis::clock::FixedClock;
use crate::analysis::cough_gate::DetectorKind;

const NOW_MS: u64 = 1_700_000_000_000;

/// Helper to create a Classifier with default settings and a fixed clock
fn create_classifier() -> Classifier {
    create_classifier_with_top_k(ClassifierConfig::default().top_k)
}

fn create_classifier_with_top_k(top_k: usize) -> Classifier {
    let config = ClassifierConfig {
        top_k,
        ..ClassifierConfig::default()
    };
    Classifier::new(SimilarityConfig::default(), config).with_clock(Arc::new(FixedClock(NOW_MS)))
}

fn bundled_corpus() -> ReferenceCorpus {
    ReferenceCorpus::load().expect("bundled corpus")
}

fn descriptor_with_centroid(centroid: f32) -> AcousticDescriptor {
    AcousticDescriptor {
        duration_secs: 1.0,
        rms_energy: 0.1,
        zero_crossing_rate: 0.1,
        spectral_centroid: centroid,
        pitch_variation: 0.3,
        harmonic_ratio: 0.5,
        coefficients: vec![0.5; 13],
    }
}

/// Corpus whose samples differ only in spectral centroid
fn centroid_corpus(samples: &[(&str, &str, f32)]) -> ReferenceCorpus {
    let samples: Vec<String> = samples
        .iter()
        .map(|(id, label, centroid)| {
            let descriptor = serde_json::to_string(&descriptor_with_centroid(*centroid)).unwrap();
            format!(
                r#"{{"id":"{id}","label":"{label}","metadata":{{"age":40,"gender":"other",
                "location":"Test","symptoms":[],"audio_quality":"good"}},
                "fingerprints":[{{"kind":"deep","descriptor":{descriptor}}}]}}"#
            )
        })
        .collect();
    ReferenceCorpus::from_json(&format!(
        r#"{{"version":1,"samples":[{}]}}"#,
        samples.join(",")
    ))
    .expect("test corpus")
}

#[test]
fn test_healthy_reference_classifies_as_healthy() {
    let classifier = create_classifier();
    let corpus = bundled_corpus();
    let query = corpus.get("healthy_pattern_1").unwrap().fingerprints[0]
        .descriptor
        .clone();

    let result = classifier.classify(&query, &corpus).unwrap();

    assert_eq!(result.dominant_condition, "Healthy");
    assert_eq!(result.top_matches.len(), 3);
    assert_eq!(result.top_matches[0].sample_id, "healthy_pattern_1");
    assert!((result.top_matches[0].similarity - 1.0).abs() < 1e-5);

    let healthy = result.condition("Healthy").unwrap();
    assert!(
        (healthy.probability - 81.6).abs() < 1.0,
        "Expected ~81.6% Healthy, got {}",
        healthy.probability
    );
    assert_eq!(healthy.confidence, Confidence::High);
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.timestamp, NOW_MS);
    assert!((result.total_probability() - 100.0).abs() < 0.01);
}

#[test]
fn test_every_reference_fingerprint_finds_its_own_label() {
    let classifier = create_classifier();
    let corpus = bundled_corpus();

    for sample in corpus.all() {
        for fingerprint in &sample.fingerprints {
            let result = classifier.classify(&fingerprint.descriptor, &corpus).unwrap();
            assert_eq!(
                result.dominant_condition, sample.label,
                "{} ({}) classified as {}",
                sample.id, fingerprint.kind, result.dominant_condition
            );
            assert!((result.total_probability() - 100.0).abs() < 0.01);
        }
    }
}

#[test]
fn test_conditions_sorted_by_probability() {
    let classifier = create_classifier_with_top_k(6);
    let corpus = bundled_corpus();
    let query = corpus.get("bronchitis_pattern_2").unwrap().fingerprints[0]
        .descriptor
        .clone();

    let result = classifier.classify(&query, &corpus).unwrap();
    for pair in result.conditions.windows(2) {
        assert!(pair[0].probability >= pair[1].probability);
    }
    assert_eq!(result.dominant_condition, result.conditions[0].name);
    assert!(result
        .conditions
        .iter()
        .all(|c| (0.0..=100.0).contains(&c.probability)));
}

#[test]
fn test_empty_corpus_is_model_not_loaded() {
    let classifier = create_classifier();
    let err = classifier
        .classify(&descriptor_with_centroid(1000.0), &ReferenceCorpus::default())
        .unwrap_err();
    assert_eq!(err, AnalysisError::ModelNotLoaded);
}

#[test]
fn test_top_one_gives_full_probability() {
    let classifier = create_classifier_with_top_k(1);
    let corpus = centroid_corpus(&[("a", "Alpha", 1000.0), ("b", "Beta", 1200.0)]);

    let result = classifier.classify(&descriptor_with_centroid(1190.0), &corpus).unwrap();
    assert_eq!(result.conditions.len(), 1);
    assert_eq!(result.dominant_condition, "Beta");
    assert!((result.conditions[0].probability - 100.0).abs() < 1e-4);
}

#[test]
fn test_top_k_larger_than_corpus_uses_all_samples() {
    let classifier = create_classifier_with_top_k(10);
    let corpus = centroid_corpus(&[("a", "Alpha", 1000.0), ("b", "Beta", 1200.0)]);

    let result = classifier.classify(&descriptor_with_centroid(1000.0), &corpus).unwrap();
    assert_eq!(result.top_matches.len(), 2);
    assert_eq!(result.conditions.len(), 2);
}

#[test]
fn test_label_count_amplifies_probability() {
    // Two Alpha matches at 0.9 each (1.8 * 2 = 3.6) against one Beta at 1.0
    let classifier = create_classifier();
    let corpus = centroid_corpus(&[
        ("a1", "Alpha", 1500.0),
        ("b1", "Beta", 0.0),
        ("a2", "Alpha", 1500.0),
    ]);

    let result = classifier.classify(&descriptor_with_centroid(0.0), &corpus).unwrap();
    assert_eq!(result.top_matches[0].sample_id, "b1");
    assert_eq!(result.dominant_condition, "Alpha");

    let alpha = result.condition("Alpha").unwrap();
    let beta = result.condition("Beta").unwrap();
    assert!((alpha.probability - 360.0 / 4.6).abs() < 0.01);
    assert!((beta.probability - 100.0 / 4.6).abs() < 0.01);
    assert!((alpha.average_similarity - 0.9).abs() < 1e-5);
}

#[test]
fn test_zero_similarity_splits_evenly() {
    let classifier = create_classifier();
    let corpus = bundled_corpus();
    let query = AcousticDescriptor {
        duration_secs: 100.0,
        rms_energy: 50.0,
        zero_crossing_rate: 50.0,
        spectral_centroid: 1.0e6,
        pitch_variation: 0.0,
        harmonic_ratio: 0.0,
        coefficients: vec![500.0; 13],
    };

    let result = classifier.classify(&query, &corpus).unwrap();
    assert!(result.top_matches.iter().all(|m| m.similarity == 0.0));
    // Stable sort keeps corpus order: healthy_1, healthy_2, asthma_1
    assert_eq!(result.conditions.len(), 2);
    assert!((result.conditions[0].probability - 50.0).abs() < 1e-4);
    assert!((result.conditions[1].probability - 50.0).abs() < 1e-4);
    assert_eq!(result.dominant_condition, "Healthy");
    assert_eq!(result.confidence, Confidence::Low);
}

#[test]
fn test_probability_tie_keeps_first_appearance() {
    let classifier = create_classifier_with_top_k(2);
    let corpus = centroid_corpus(&[("a", "Alpha", 1300.0), ("b", "Beta", 700.0)]);

    let result = classifier.classify(&descriptor_with_centroid(1000.0), &corpus).unwrap();
    assert_eq!(result.conditions[0].probability, result.conditions[1].probability);
    assert_eq!(result.dominant_condition, "Alpha");
}

#[test]
fn test_confidence_buckets() {
    let config = ClassifierConfig::default();
    assert_eq!(Confidence::from_similarity(0.95, &config), Confidence::High);
    assert_eq!(Confidence::from_similarity(0.7, &config), Confidence::Medium);
    assert_eq!(Confidence::from_similarity(0.55, &config), Confidence::Medium);
    assert_eq!(Confidence::from_similarity(0.4, &config), Confidence::Low);
    assert_eq!(Confidence::from_similarity(0.0, &config), Confidence::Low);
}

#[test]
fn test_no_cough_result() {
    let classifier = create_classifier();
    let corpus = bundled_corpus();
    let decision = CoughDecision {
        is_cough: false,
        confidence: 0.3,
        score: 0.3,
        detector: DetectorKind::Heuristic,
    };

    let result = classifier.no_cough_result(&corpus, 2.0, decision);
    assert_eq!(result.dominant_condition, NO_COUGH_LABEL);
    assert_eq!(result.confidence, Confidence::Low);
    assert_eq!(result.conditions.len(), corpus.labels().len());
    assert!(result
        .conditions
        .iter()
        .all(|c| c.probability == 2.0 && c.confidence == Confidence::Low));
    assert_eq!(result.cough_detection, Some(decision));
    assert!(result.top_matches.is_empty());
}

#[test]
fn test_result_serializes_camel_case() {
    let classifier = create_classifier();
    let corpus = bundled_corpus();
    let query = corpus.get("covid19_pattern_1").unwrap().fingerprints[0]
        .descriptor
        .clone();
    let result = classifier.classify(&query, &corpus).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["dominantCondition"], "COVID-19");
    assert_eq!(json["confidence"], "high");
    assert_eq!(json["timestamp"], NOW_MS);
    assert!(json["conditions"][0]["averageSimilarity"].is_number());
    assert!(json["topMatches"][0]["sampleId"].is_string());
    assert!(json.get("coughDetection").is_none());

    let back: ClassificationResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}
