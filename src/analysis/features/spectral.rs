// Spectral module - Frequency-domain feature extraction
//
// This module computes the spectral side features of a recording: the
// energy-weighted spectral centroid of the whole signal, the cepstral
// coefficient sequence of the log-mel envelope, and two bounded heuristics
// (pitch variation, harmonic ratio) derived from centroid and ZCR.
//
// The two heuristics are coarse approximations used as extra descriptors;
// they are not physically exact acoustic measures.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Davis & Mermelstein (1980), cepstral coefficients of mel energies

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::{Arc, Mutex};

use super::mel::MelSpectrogram;

/// ZCR at which the harmonic-ratio heuristic reaches zero
const NOISY_ZCR: f32 = 0.5;

/// Guard against division by zero in ratios
const EPSILON: f32 = 1e-10;

/// Spectral feature computation functions
///
/// The planner caches one plan per signal length, so repeated extractions of
/// equally long recordings reuse the same plan.
pub struct SpectralFeatures {
    sample_rate: u32,
    fft_planner: Arc<Mutex<FftPlanner<f32>>>,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
        }
    }

    /// Forward plan of length `len`; the lock is released before processing
    fn plan(&self, len: usize) -> Arc<dyn Fft<f32>> {
        let mut planner = match self.fft_planner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        planner.plan_fft_forward(len)
    }

    fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Compute spectral centroid of the whole signal
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|²) / Σ|X[i]|²
    ///
    /// The signal is transformed in one piece (zero-padded to a power of two)
    /// so the result reflects the full recording rather than one frame.
    ///
    /// # Returns
    /// Spectral centroid in Hz, 0.0 for silence
    pub fn compute_centroid(&self, audio: &[f32]) -> f32 {
        if audio.is_empty() {
            return 0.0;
        }

        let fft_len = audio.len().next_power_of_two();
        let mut buffer: Vec<Complex<f32>> =
            audio.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(fft_len, Complex::new(0.0, 0.0));
        self.plan(fft_len).process(&mut buffer);

        let freq_bin_width = self.sample_rate as f64 / fft_len as f64;
        let (weighted_sum, energy_sum) = buffer[..fft_len / 2 + 1].iter().enumerate().fold(
            (0.0f64, 0.0f64),
            |(weighted, total), (i, c)| {
                let energy = c.norm_sqr() as f64;
                (weighted + i as f64 * freq_bin_width * energy, total + energy)
            },
        );

        if energy_sum > EPSILON as f64 {
            (weighted_sum / energy_sum) as f32
        } else {
            0.0
        }
    }

    /// Cepstral coefficients of the time-averaged log-mel envelope
    ///
    /// Only frames that came from the signal are averaged. The band mean is
    /// removed before the DCT-II so overall loudness does not leak into the
    /// shape; coefficient `k` (1-based) is the amplitude of the k-th cosine
    /// component of the envelope in natural-log units.
    ///
    /// # Returns
    /// `count` coefficients, all zero when the signal produced no frames
    pub fn compute_coefficients(&self, mel: &MelSpectrogram, count: usize) -> Vec<f32> {
        let bands = mel.bands;
        if mel.active_frames == 0 || bands == 0 {
            return vec![0.0; count];
        }

        let active = &mel.frames[..mel.active_frames];
        let envelope: Vec<f32> = (0..bands)
            .map(|b| active.iter().map(|frame| frame[b]).sum::<f32>() / active.len() as f32)
            .collect();
        let mean = envelope.iter().sum::<f32>() / bands as f32;

        (1..=count)
            .map(|k| {
                let sum: f32 = envelope
                    .iter()
                    .enumerate()
                    .map(|(n, &value)| {
                        let angle =
                            std::f32::consts::PI * k as f32 * (n as f32 + 0.5) / bands as f32;
                        (value - mean) * angle.cos()
                    })
                    .sum();
                2.0 * sum / bands as f32
            })
            .collect()
    }

    /// Pitch variation heuristic (0.0 to 1.0)
    ///
    /// Relative disagreement between the spectral centroid and the
    /// ZCR-implied frequency `zcr * sample_rate / 2`.
    pub fn estimate_pitch_variation(&self, centroid: f32, zcr: f32) -> f32 {
        let zcr_frequency = zcr * self.nyquist();
        let reference = centroid.max(zcr_frequency);
        if reference < EPSILON {
            return 0.0;
        }
        ((centroid - zcr_frequency).abs() / reference).clamp(0.0, 1.0)
    }

    /// Harmonic ratio heuristic (0.0 to 1.0)
    ///
    /// High for low-ZCR, low-centroid (tonal) signals, low for noisy ones.
    pub fn estimate_harmonic_ratio(&self, centroid: f32, zcr: f32) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let tonality = 1.0 - (zcr / NOISY_ZCR).clamp(0.0, 1.0);
        let darkness = 1.0 - (centroid / self.nyquist()).clamp(0.0, 1.0);
        tonality * darkness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_centroid_tracks_sine_frequency() {
        let spectral = SpectralFeatures::new(16_000);
        let low = spectral.compute_centroid(&sine(250.0, 16_000, 16_384));
        let high = spectral.compute_centroid(&sine(4000.0, 16_000, 16_384));
        assert!((low - 250.0).abs() < 50.0, "low centroid {}", low);
        assert!((high - 4000.0).abs() < 100.0, "high centroid {}", high);
    }

    #[test]
    fn test_centroid_of_silence_is_zero() {
        let spectral = SpectralFeatures::new(16_000);
        assert_eq!(spectral.compute_centroid(&[0.0; 2048]), 0.0);
        assert_eq!(spectral.compute_centroid(&[]), 0.0);
    }

    #[test]
    fn test_centroid_reuses_cached_plan() {
        let spectral = SpectralFeatures::new(16_000);
        let signal = sine(1000.0, 16_000, 4096);
        let first = spectral.compute_centroid(&signal);
        assert_eq!(spectral.compute_centroid(&signal), first);
        assert!(Arc::ptr_eq(&spectral.plan(4096), &spectral.plan(4096)));
    }

    #[test]
    fn test_flat_envelope_has_zero_coefficients() {
        let spectral = SpectralFeatures::new(16_000);
        let mel = MelSpectrogram {
            frames: vec![vec![-3.0; 64]; 10],
            bands: 64,
            active_frames: 10,
        };
        let coefficients = spectral.compute_coefficients(&mel, 13);
        assert_eq!(coefficients.len(), 13);
        assert!(coefficients.iter().all(|c| c.abs() < 1e-5));
    }

    #[test]
    fn test_cosine_envelope_maps_to_its_coefficient() {
        let spectral = SpectralFeatures::new(16_000);
        let bands = 64;
        let envelope: Vec<f32> = (0..bands)
            .map(|n| 2.0 * (PI * 3.0 * (n as f32 + 0.5) / bands as f32).cos() - 10.0)
            .collect();
        let mel = MelSpectrogram {
            frames: vec![envelope; 4],
            bands,
            active_frames: 4,
        };
        let coefficients = spectral.compute_coefficients(&mel, 13);
        assert!((coefficients[2] - 2.0).abs() < 1e-3, "{:?}", coefficients);
        assert!(coefficients[0].abs() < 1e-3);
        assert!(coefficients[5].abs() < 1e-3);
    }

    #[test]
    fn test_no_active_frames_gives_zero_coefficients() {
        let spectral = SpectralFeatures::new(16_000);
        let mel = MelSpectrogram {
            frames: vec![vec![-23.0; 16]; 8],
            bands: 16,
            active_frames: 0,
        };
        assert_eq!(spectral.compute_coefficients(&mel, 13), vec![0.0; 13]);
    }

    #[test]
    fn test_heuristics_are_bounded() {
        let spectral = SpectralFeatures::new(16_000);
        for (centroid, zcr) in [(0.0, 0.0), (500.0, 0.02), (3000.0, 0.3), (8000.0, 1.0)] {
            let pv = spectral.estimate_pitch_variation(centroid, zcr);
            let hr = spectral.estimate_harmonic_ratio(centroid, zcr);
            assert!((0.0..=1.0).contains(&pv));
            assert!((0.0..=1.0).contains(&hr));
        }
        assert_eq!(spectral.estimate_pitch_variation(0.0, 0.0), 0.0);
        assert!(
            spectral.estimate_harmonic_ratio(300.0, 0.02)
                > spectral.estimate_harmonic_ratio(5000.0, 0.4)
        );
    }
}
