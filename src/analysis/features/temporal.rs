// Temporal module - side features read straight off the samples
//
// Duration, RMS energy and zero-crossing rate of the whole preprocessed
// recording. None of them look at the spectrum.

/// Duration, loudness and sign-change rate of a mono signal
pub struct TemporalFeatures {
    sample_rate: u32,
}

impl TemporalFeatures {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Recording length in seconds
    pub fn compute_duration(&self, audio: &[f32]) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        audio.len() as f32 / self.sample_rate as f32
    }

    /// Compute root-mean-square energy
    ///
    /// Formula: RMS = sqrt(mean(x[n]²))
    pub fn compute_rms(&self, audio: &[f32]) -> f32 {
        if audio.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = audio.iter().map(|&x| (x as f64) * (x as f64)).sum();
        (sum_squares / audio.len() as f64).sqrt() as f32
    }

    /// Fraction of adjacent sample pairs whose signs differ (0.0 to 1.0)
    ///
    /// Zero counts as positive. Noisy, bright coughs sit well above 0.1;
    /// voiced, low-pitched ones below it.
    pub fn compute_zcr(&self, audio: &[f32]) -> f32 {
        if audio.len() < 2 {
            return 0.0;
        }

        let crossings = audio
            .windows(2)
            .filter(|pair| (pair[1] >= 0.0) != (pair[0] >= 0.0))
            .count();

        // Normalize by number of adjacent pairs
        crossings as f32 / (audio.len() - 1) as f32
    }
}
