use std::sync::Arc;
use std::thread;

use cough_analyzer::analysis::classifier::NO_COUGH_LABEL;
use cough_analyzer::analysis::clock::FixedClock;
use cough_analyzer::{
    AnalysisError, AppConfig, AudioBuffer, CancellationFlag, CoughAnalyzer, ReferenceCorpus,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn analyzer() -> CoughAnalyzer {
    let corpus = Arc::new(ReferenceCorpus::load().expect("bundled corpus"));
    CoughAnalyzer::new(AppConfig::load(), corpus)
        .expect("analyzer")
        .with_clock(Arc::new(FixedClock(1_234)))
}

fn burst(seed: u64, sample_rate: u32, secs: f32) -> AudioBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let total = (secs * sample_rate as f32) as usize;
    let burst = total / 3;
    let samples = (0..total)
        .map(|i| {
            if i < burst {
                rng.gen_range(-0.5..0.5) * (-3.0 * i as f32 / burst as f32).exp()
            } else {
                0.0
            }
        })
        .collect();
    AudioBuffer::mono(samples, sample_rate)
}

#[test]
fn silent_buffer_yields_identical_results() {
    let analyzer = analyzer();
    let buffer = AudioBuffer::mono(vec![0.0; 16_000], 16_000);
    let a = analyzer.analyze(&buffer).unwrap();
    let b = analyzer.analyze(&buffer).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.dominant_condition, NO_COUGH_LABEL);
    assert_eq!(a.timestamp, 1_234);
}

#[test]
fn bursts_of_any_length_produce_valid_distributions() {
    let analyzer = analyzer();
    for (seed, secs) in [(1, 0.5), (2, 1.0), (3, 2.5), (4, 5.0)] {
        let result = analyzer.analyze(&burst(seed, 16_000, secs)).unwrap();
        assert!(result.cough_detection.unwrap().is_cough, "{secs}s burst rejected");
        assert!((result.total_probability() - 100.0).abs() < 0.01);
        assert!(result
            .conditions
            .windows(2)
            .all(|pair| pair[0].probability >= pair[1].probability));
        assert_eq!(result.dominant_condition, result.conditions[0].name);
    }
}

#[test]
fn sample_rate_does_not_change_vector_length() {
    let analyzer = analyzer();
    for rate in [8_000, 16_000, 22_050, 44_100, 48_000] {
        let features = analyzer.extract_features(&burst(7, rate, 1.0)).unwrap();
        assert_eq!(features.len(), 1024, "rate {rate}");
    }
}

#[test]
fn batch_results_follow_input_order() {
    let analyzer = analyzer();
    let buffers = vec![
        burst(1, 16_000, 1.0),
        AudioBuffer::mono(vec![0.0; 8_000], 16_000),
        burst(2, 44_100, 1.5),
    ];

    let batch = analyzer.analyze_batch(&buffers, None);
    let individual: Vec<_> = buffers.iter().map(|b| analyzer.analyze(b)).collect();
    assert_eq!(batch, individual);
    assert_eq!(analyzer.analyze_batch_parallel(&buffers, 3, None), individual);
}

#[test]
fn ragged_interleaving_is_invalid_input() {
    let analyzer = analyzer();
    let err = analyzer
        .analyze(&AudioBuffer::new(vec![0.1; 101], 16_000, 2))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput { .. }));
}

#[test]
fn cancellation_before_start_cancels_everything() {
    let analyzer = analyzer();
    let buffers: Vec<_> = (0..4).map(|i| burst(i, 16_000, 0.5)).collect();
    let cancel = CancellationFlag::new();
    cancel.clone().cancel();

    let results = analyzer.analyze_batch_parallel(&buffers, 2, Some(&cancel));
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r == &Err(AnalysisError::Cancelled)));
}

#[test]
fn analyzer_is_shared_across_threads() {
    let analyzer = Arc::new(analyzer());
    let expected = analyzer.analyze(&burst(5, 16_000, 1.0)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let analyzer = Arc::clone(&analyzer);
            thread::spawn(move || analyzer.analyze(&burst(5, 16_000, 1.0)).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
