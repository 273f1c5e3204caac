// AudioPreprocessor - canonical sample rate and channel layout
//
// Every buffer entering the feature pipeline is converted to mono at the
// analyzer's target sample rate. Downmixing averages the channels of each
// frame; resampling uses linear interpolation between the two nearest
// source samples.

use super::AudioBuffer;
use crate::error::AnalysisError;

/// Converts arbitrary captures into the canonical mono format
#[derive(Debug, Clone, Copy)]
pub struct AudioPreprocessor {
    target_sample_rate: u32,
}

impl AudioPreprocessor {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Normalize `buffer` to mono at the target sample rate
    ///
    /// The input is never mutated. A mono buffer already at the target rate
    /// is returned as an identical copy.
    ///
    /// # Errors
    /// `InvalidInput` when the buffer fails [`AudioBuffer::validate`].
    pub fn normalize(&self, buffer: &AudioBuffer) -> Result<AudioBuffer, AnalysisError> {
        buffer.validate()?;

        let mono = downmix(buffer.samples(), buffer.channels());
        let samples = if buffer.sample_rate() == self.target_sample_rate {
            mono
        } else {
            resample_linear(&mono, buffer.sample_rate(), self.target_sample_rate)
        };

        Ok(AudioBuffer::mono(samples, self.target_sample_rate))
    }
}

/// Average interleaved channels into one channel
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample by linear interpolation
///
/// Output length is `round(len * to / from)`. Output index `i` reads the
/// source position `i / (to / from)` and blends the two nearest samples;
/// positions past the last sample hold the last sample.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let out_len = (samples.len() as f64 * ratio).round() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let position = i as f64 / ratio;
            let idx0 = (position.floor() as usize).min(last);
            let idx1 = (idx0 + 1).min(last);
            let frac = (position - idx0 as f64).clamp(0.0, 1.0) as f32;
            samples[idx0] * (1.0 - frac) + samples[idx1] * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 * 0.01).sin()).collect();
        let buffer = AudioBuffer::mono(samples.clone(), 16_000);
        let out = AudioPreprocessor::new(16_000).normalize(&buffer).unwrap();
        assert_eq!(out.samples(), samples.as_slice());
        assert_eq!(out.sample_rate(), 16_000);
    }

    #[test]
    fn test_resample_output_length() {
        for (len, from, to) in [
            (44_100usize, 44_100u32, 16_000u32),
            (1_000, 48_000, 16_000),
            (333, 22_050, 16_000),
            (100, 8_000, 16_000),
            (7, 11_025, 16_000),
        ] {
            let samples = vec![0.25; len];
            let out = resample_linear(&samples, from, to);
            let expected = (len as f64 * to as f64 / from as f64).round() as usize;
            assert_eq!(out.len(), expected, "{} samples {} -> {}", len, from, to);
        }
    }

    #[test]
    fn test_upsample_interpolates_midpoints() {
        let out = resample_linear(&[0.0, 1.0, 0.0], 8_000, 16_000);
        assert_eq!(out.len(), 6);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
        assert!((out[4] - 0.0).abs() < 1e-6);
        assert!((out[5] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let buffer = AudioBuffer::new(vec![0.2, 0.6, -0.4, 0.0], 16_000, 2);
        let out = AudioPreprocessor::new(16_000).normalize(&buffer).unwrap();
        assert_eq!(out.channels(), 1);
        assert_eq!(out.samples().len(), 2);
        assert!((out.samples()[0] - 0.4).abs() < 1e-6);
        assert!((out.samples()[1] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let buffer = AudioBuffer::new(vec![0.5; 96], 48_000, 2);
        let before = buffer.clone();
        let out = AudioPreprocessor::new(16_000).normalize(&buffer).unwrap();
        assert_eq!(buffer, before);
        assert_eq!(out.samples().len(), 16);
    }

    #[test]
    fn test_normalize_rejects_empty_buffer() {
        let buffer = AudioBuffer::mono(Vec::new(), 44_100);
        assert!(matches!(
            AudioPreprocessor::new(16_000).normalize(&buffer),
            Err(AnalysisError::InvalidInput { .. })
        ));
    }
}
