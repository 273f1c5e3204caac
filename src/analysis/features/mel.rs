// Mel module - mel filterbank projection and log compression
//
// Maps linear-frequency power spectra onto triangular filters evenly spaced
// on the mel scale between 0 Hz and Nyquist, log-compresses the band
// energies and fixes the time axis to a constant number of frames.
//
// References:
// - Stevens, Volkmann & Newman (1937), mel scale
// - O'Shaughnessy (1987), 2595 * log10(1 + f/700) formulation

use super::fft::SpectrumFrame;

/// Convert frequency in Hz to mel
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel back to frequency in Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Log-compressed mel band energies with a fixed number of frames
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram {
    /// `frame_count` rows of `bands` log energies
    pub frames: Vec<Vec<f32>>,
    /// Number of mel bands per frame
    pub bands: usize,
    /// Frames that came from the signal (the rest are silent padding)
    pub active_frames: usize,
}

/// Triangular mel filterbank, `bands` rows of `bins` weights
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<Vec<f32>>,
}

impl MelFilterbank {
    /// Build `bands` overlapping triangles spanning 0 Hz to `sample_rate / 2`
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate of the analysed signal in Hz
    /// * `fft_len` - Transform length the spectra were computed with
    /// * `bands` - Number of mel bands
    pub fn new(sample_rate: u32, fft_len: usize, bands: usize) -> Self {
        let bins = fft_len / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;
        let max_mel = hz_to_mel(nyquist);
        let step = max_mel / (bands + 1) as f32;

        // bands + 2 edge frequencies: left, centre and right of every triangle
        let edges: Vec<f32> = (0..bands + 2)
            .map(|i| mel_to_hz(i as f32 * step))
            .collect();
        let bin_hz = sample_rate as f32 / fft_len as f32;

        let filters = (0..bands)
            .map(|b| {
                let (left, centre, right) = (edges[b], edges[b + 1], edges[b + 2]);
                (0..bins)
                    .map(|k| {
                        let freq = k as f32 * bin_hz;
                        if freq > left && freq < centre {
                            (freq - left) / (centre - left)
                        } else if freq >= centre && freq < right {
                            (right - freq) / (right - centre)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Self { filters }
    }

    pub fn bands(&self) -> usize {
        self.filters.len()
    }

    /// Weighted sum of `power` under every filter
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| filter.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }
}

/// Projects spectrogram frames onto a fixed-size log-mel grid
#[derive(Debug, Clone)]
pub struct MelProjector {
    filterbank: MelFilterbank,
    frame_count: usize,
    log_epsilon: f32,
}

impl MelProjector {
    pub fn new(
        sample_rate: u32,
        fft_len: usize,
        bands: usize,
        frame_count: usize,
        log_epsilon: f32,
    ) -> Self {
        Self {
            filterbank: MelFilterbank::new(sample_rate, fft_len, bands),
            frame_count,
            log_epsilon,
        }
    }

    pub fn bands(&self) -> usize {
        self.filterbank.bands()
    }

    /// Project power (`magnitude²`) onto the filterbank and log-compress
    ///
    /// The time axis is truncated or padded to `frame_count`; padding frames
    /// carry zero power, i.e. `ln(epsilon)` after compression.
    pub fn project(&self, spectrogram: &[SpectrumFrame]) -> MelSpectrogram {
        let bands = self.bands();
        let silent = self.log_epsilon.ln();
        let active_frames = spectrogram.len().min(self.frame_count);

        let mut frames: Vec<Vec<f32>> = spectrogram[..active_frames]
            .iter()
            .map(|frame| {
                let power: Vec<f32> = frame.magnitude.iter().map(|m| m * m).collect();
                self.filterbank
                    .apply(&power)
                    .into_iter()
                    .map(|energy| (energy + self.log_epsilon).ln())
                    .collect()
            })
            .collect();
        frames.resize(self.frame_count, vec![silent; bands]);

        MelSpectrogram {
            frames,
            bands,
            active_frames,
        }
    }
}
