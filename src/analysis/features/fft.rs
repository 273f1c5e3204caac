// FFT module - short-time Fourier transform
//
// Frames the signal, applies a Hamming window and computes magnitude and
// phase for the non-redundant half of each frame's spectrum. Frame sizes
// that are not a power of two are zero-padded to the next power of two.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Magnitude and phase of one analysis frame
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    /// `sqrt(re² + im²)` per bin
    pub magnitude: Vec<f32>,
    /// `atan2(im, re)` per bin
    pub phase: Vec<f32>,
}

/// Hamming window `0.54 - 0.46 cos(2πn / (N - 1))`
pub fn hamming_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|n| {
            0.54 - 0.46 * ((2.0 * std::f32::consts::PI * n as f32) / (len as f32 - 1.0)).cos()
        })
        .collect()
}

/// Number of full frames: `floor((len - frame) / hop) + 1`, or 0 when `len < frame`
pub fn frame_count(len: usize, frame_size: usize, hop_size: usize) -> usize {
    if len < frame_size || frame_size == 0 || hop_size == 0 {
        0
    } else {
        (len - frame_size) / hop_size + 1
    }
}

/// FFT processor that computes magnitude/phase spectra from audio frames
///
/// The FFT plan is created once and shared, so one processor can serve
/// concurrent callers.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    frame_size: usize,
    fft_len: usize,
    /// Hamming window (pre-computed)
    window: Vec<f32>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `frame_size` - Analysis frame length in samples
    pub fn new(frame_size: usize) -> Self {
        let fft_len = frame_size.max(1).next_power_of_two();
        let fft = FftPlanner::new().plan_fft_forward(fft_len);

        Self {
            fft,
            frame_size,
            fft_len,
            window: hamming_window(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Transform length after power-of-two padding
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Bins per frame (`fft_len / 2 + 1`)
    pub fn bins(&self) -> usize {
        self.fft_len / 2 + 1
    }

    /// Window, transform and split one frame into magnitude and phase
    ///
    /// # Arguments
    /// * `frame` - Audio frame (length <= frame_size; shorter frames are zero-padded)
    pub fn compute_frame(&self, frame: &[f32]) -> SpectrumFrame {
        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        buffer.resize(self.fft_len, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        let half = &buffer[..self.bins()];
        SpectrumFrame {
            magnitude: half.iter().map(|c| c.norm()).collect(),
            phase: half.iter().map(|c| c.im.atan2(c.re)).collect(),
        }
    }

    /// Short-time spectrum of `samples` with the given hop
    ///
    /// Only the first `max_frames` frames are computed, so the cost is bounded
    /// by the fixed time axis rather than the recording length. Signals
    /// shorter than one frame yield an empty spectrogram.
    pub fn transform(
        &self,
        samples: &[f32],
        hop_size: usize,
        max_frames: usize,
    ) -> Vec<SpectrumFrame> {
        let frames = frame_count(samples.len(), self.frame_size, hop_size).min(max_frames);
        (0..frames)
            .map(|i| {
                let start = i * hop_size;
                self.compute_frame(&samples[start..start + self.frame_size])
            })
            .collect()
    }
}

/// One-shot STFT of every frame for callers without a reusable processor
pub fn transform(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<SpectrumFrame> {
    FftProcessor::new(frame_size).transform(samples, hop_size, usize::MAX)
}
