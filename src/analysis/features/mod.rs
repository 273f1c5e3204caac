// FeatureExtractor - DSP feature extraction for cough classification
//
// This module turns a preprocessed mono signal into a fixed-length feature
// vector plus a scalar acoustic descriptor. The vector feeds the cough gate;
// the descriptor feeds the similarity scorer.
//
// Module organization:
// - types: Data structures (FeatureVector, AcousticDescriptor)
// - fft: Short-time FFT with Hamming windowing
// - mel: Mel filterbank projection and log compression
// - reducer: Per-band statistics over the fixed time axis
// - spectral: Frequency-domain features (centroid, coefficients, heuristics)
// - temporal: Time-domain features (duration, RMS, ZCR)
// - mod.rs: Coordinator (FeatureExtractor)
//
// Pipeline:
// 1. STFT (frame_size / hop_size, Hamming window)
// 2. Power spectrum onto mel bands, ln(x + epsilon), time axis fixed to frame_count
// 3. mean / std / min / max per band, padded to feature_len
// 4. Side features from the raw samples and the log-mel envelope
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

pub mod fft;
pub mod mel;
pub mod reducer;
pub mod spectral;
pub mod temporal;
mod types;

pub use fft::SpectrumFrame;
pub use mel::MelSpectrogram;
pub use types::{AcousticDescriptor, FeatureVector, CANONICAL_FEATURE_LEN, COEFFICIENT_COUNT};

use crate::config::SpectralConfig;
use crate::debug::PipelineStage;
use crate::trace_pipeline;
use fft::FftProcessor;
use mel::MelProjector;
use reducer::FeatureReducer;
use spectral::SpectralFeatures;
use temporal::TemporalFeatures;

/// FeatureExtractor coordinates the DSP feature extraction pipeline
///
/// Holds the planned FFT, the mel filterbank and the reducer so repeated
/// extractions do not rebuild them. All state is read-only after
/// construction; one extractor can be shared across threads.
pub struct FeatureExtractor {
    fft_processor: FftProcessor,
    mel_projector: MelProjector,
    reducer: FeatureReducer,
    spectral_features: SpectralFeatures,
    temporal_features: TemporalFeatures,
    hop_size: usize,
    frame_count: usize,
    coefficient_count: usize,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate of the signals passed to `extract` (Hz)
    /// * `config` - Frame, hop, band and vector sizes
    pub fn new(sample_rate: u32, config: &SpectralConfig) -> Self {
        let fft_processor = FftProcessor::new(config.frame_size);
        let mel_projector = MelProjector::new(
            sample_rate,
            fft_processor.fft_len(),
            config.mel_bands,
            config.frame_count,
            config.log_epsilon,
        );

        Self {
            fft_processor,
            mel_projector,
            reducer: FeatureReducer::new(config.feature_len),
            spectral_features: SpectralFeatures::new(sample_rate),
            temporal_features: TemporalFeatures::new(sample_rate),
            hop_size: config.hop_size,
            frame_count: config.frame_count,
            coefficient_count: config.coefficient_count,
        }
    }

    /// Short-time spectrum of `samples`, at most `frame_count` frames
    pub fn spectrogram(&self, samples: &[f32]) -> Vec<SpectrumFrame> {
        self.fft_processor.transform(samples, self.hop_size, self.frame_count)
    }

    /// Log-mel spectrogram of `samples` with the fixed time axis
    pub fn mel_spectrogram(&self, samples: &[f32]) -> MelSpectrogram {
        self.mel_projector.project(&self.spectrogram(samples))
    }

    /// Extract the feature vector of a preprocessed mono signal
    ///
    /// # Arguments
    /// * `samples` - Mono samples at the extractor's sample rate
    ///
    /// # Returns
    /// FeatureVector of exactly `feature_len` values. Signals shorter than
    /// one frame produce an all-silent spectrogram rather than an error.
    /// Non-finite intermediate values are replaced by 0.
    pub fn extract(&self, samples: &[f32]) -> FeatureVector {
        let spectrum = self.spectrogram(samples);
        trace_pipeline!(
            PipelineStage::Stft,
            "frames={} bins={}",
            spectrum.len(),
            self.fft_processor.bins()
        );

        let mel = self.mel_projector.project(&spectrum);
        trace_pipeline!(
            PipelineStage::Mel,
            "bands={} frames={} active={}",
            mel.bands,
            mel.frames.len(),
            mel.active_frames
        );

        let values: Vec<f32> = self.reducer.reduce(&mel).into_iter().map(finite_or_zero).collect();

        let centroid = finite_or_zero(self.spectral_features.compute_centroid(samples));
        let zcr = finite_or_zero(self.temporal_features.compute_zcr(samples));
        let descriptor = AcousticDescriptor {
            duration_secs: finite_or_zero(self.temporal_features.compute_duration(samples)),
            rms_energy: finite_or_zero(self.temporal_features.compute_rms(samples)),
            zero_crossing_rate: zcr,
            spectral_centroid: centroid,
            pitch_variation: finite_or_zero(
                self.spectral_features.estimate_pitch_variation(centroid, zcr),
            ),
            harmonic_ratio: finite_or_zero(
                self.spectral_features.estimate_harmonic_ratio(centroid, zcr),
            ),
            coefficients: self
                .spectral_features
                .compute_coefficients(&mel, self.coefficient_count)
                .into_iter()
                .map(finite_or_zero)
                .collect(),
        };

        trace_pipeline!(
            PipelineStage::Reduce,
            "len={} centroid={:.1}Hz zcr={:.3} rms={:.4}",
            values.len(),
            descriptor.spectral_centroid,
            descriptor.zero_crossing_rate,
            descriptor.rms_energy
        );

        FeatureVector::new(values, self.reducer.feature_len(), mel.bands, descriptor)
            .with_time_axis(mel.active_frames, mel.frames.len())
    }
}

#[inline]
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(16_000, &SpectralConfig::default())
    }

    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-0.5..0.5)).collect()
    }

    #[test]
    fn test_vector_length_is_fixed_for_any_duration() {
        let extractor = extractor();
        for len in [0usize, 100, 1023, 1024, 16_000, 48_000, 160_000] {
            let vector = extractor.extract(&noise(len, len as u64));
            assert_eq!(vector.len(), CANONICAL_FEATURE_LEN, "input len {}", len);
            assert_eq!(vector.descriptor().coefficients.len(), COEFFICIENT_COUNT);
            assert!(vector.values().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_statistics_layout_and_padding() {
        let vector = extractor().extract(&noise(16_000, 7));
        assert_eq!(vector.mel_bands(), 128);
        assert_eq!(vector.statistics().len(), 512);
        assert!(vector.values()[512..].iter().all(|&v| v == 0.0));
        assert_eq!(vector.frame_count(), 128);
        assert_eq!(vector.active_frames(), 59);
    }

    #[test]
    fn test_silence_is_deterministic() {
        let extractor = extractor();
        let a = extractor.extract(&vec![0.0; 16_000]);
        let b = extractor.extract(&vec![0.0; 16_000]);
        assert_eq!(a, b);

        let floor = 1e-10f32.ln();
        assert!(a.block(0).iter().all(|&m| (m - floor).abs() < 1e-3));
        assert!(a.block(1).iter().all(|&s| s.abs() < 1e-3));
        assert_eq!(a.descriptor().rms_energy, 0.0);
        assert_eq!(a.descriptor().spectral_centroid, 0.0);
    }

    #[test]
    fn test_descriptor_reflects_signal() {
        let extractor = extractor();
        let vector = extractor.extract(&noise(32_000, 3));
        let descriptor = vector.descriptor();
        assert!((descriptor.duration_secs - 2.0).abs() < 1e-6);
        assert!(descriptor.rms_energy > 0.2 && descriptor.rms_energy < 0.35);
        assert!(descriptor.zero_crossing_rate > 0.3);
        assert!(descriptor.spectral_centroid > 2000.0);
    }

    #[test]
    fn test_mel_spectrogram_has_fixed_time_axis() {
        let extractor = extractor();
        let short = extractor.mel_spectrogram(&noise(2048, 1));
        let long = extractor.mel_spectrogram(&noise(160_000, 2));
        assert_eq!(short.frames.len(), 128);
        assert_eq!(long.frames.len(), 128);
        assert_eq!(short.active_frames, 5);
        assert_eq!(long.active_frames, 128);
    }

    #[test]
    fn test_long_input_only_transforms_the_fixed_time_axis() {
        let extractor = extractor();
        let samples = noise(16_000 * 60, 4);
        assert_eq!(extractor.spectrogram(&samples).len(), 128);

        // Everything past the time axis only reaches the side features
        let head = &samples[..128 * 256 + 768];
        let full = extractor.extract(&samples);
        let cut = extractor.extract(head);
        assert_eq!(full.statistics(), cut.statistics());
        assert_eq!(full.descriptor().coefficients, cut.descriptor().coefficients);
    }
}
