// Audio module - captured audio buffers and canonical-format normalization

pub mod preprocess;

pub use preprocess::AudioPreprocessor;

use crate::error::AnalysisError;

/// Immutable audio capture handed to the analyzer
///
/// Samples are interleaved when `channels > 1` and are expected to lie in
/// [-1, 1]. The buffer never changes after construction; every processing
/// stage produces a new buffer instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples
    ///
    /// Construction is infallible so that capture code can always hand over
    /// what it recorded; [`AudioBuffer::validate`] runs before any transform.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Create a single-channel buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f32 / self.sample_rate as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reject buffers no pipeline stage can process
    ///
    /// # Errors
    /// `InvalidInput` for zero samples, zero channels, zero sample rate,
    /// a sample count that is not a multiple of the channel count, or any
    /// NaN/infinite sample.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.samples.is_empty() {
            return Err(AnalysisError::invalid_input("buffer has zero samples"));
        }
        if self.channels == 0 {
            return Err(AnalysisError::invalid_input(
                "buffer must have at least one channel",
            ));
        }
        if self.sample_rate == 0 {
            return Err(AnalysisError::invalid_input("sample rate must be > 0"));
        }
        if self.samples.len() % self.channels as usize != 0 {
            return Err(AnalysisError::invalid_input(format!(
                "{} samples cannot be split into {} channels",
                self.samples.len(),
                self.channels
            )));
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::invalid_input(format!(
                "non-finite sample at index {}",
                index
            )));
        }
        Ok(())
    }
}
