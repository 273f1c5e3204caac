// Reducer module - time pooling of the log-mel spectrogram
//
// Collapses the fixed time axis into four statistics per band and lays them
// out as `[means | stds | mins | maxs]`, then pads or truncates to the
// canonical vector length.

use super::mel::MelSpectrogram;

/// Pools a mel spectrogram into a fixed-length statistics vector
#[derive(Debug, Clone, Copy)]
pub struct FeatureReducer {
    feature_len: usize,
}

impl FeatureReducer {
    pub fn new(feature_len: usize) -> Self {
        Self { feature_len }
    }

    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// Per-band mean, standard deviation, min and max across frames
    ///
    /// # Returns
    /// Exactly `feature_len` values; trailing values are zero when
    /// `4 * bands < feature_len`.
    pub fn reduce(&self, mel: &MelSpectrogram) -> Vec<f32> {
        let bands = mel.bands;
        let mut means = Vec::with_capacity(bands);
        let mut stds = Vec::with_capacity(bands);
        let mut mins = Vec::with_capacity(bands);
        let mut maxs = Vec::with_capacity(bands);

        for band in 0..bands {
            let column: Vec<f32> = mel.frames.iter().map(|frame| frame[band]).collect();
            let (mean, std, min, max) = summarize(&column);
            means.push(mean);
            stds.push(std);
            mins.push(min);
            maxs.push(max);
        }

        let mut values = Vec::with_capacity(self.feature_len.max(4 * bands));
        values.extend(means);
        values.extend(stds);
        values.extend(mins);
        values.extend(maxs);
        values.resize(self.feature_len, 0.0);
        values
    }
}

/// Mean, population standard deviation, min and max; zeros for an empty column
///
/// Accumulates in f64 so the cough gate can subtract the padding frames back
/// out of the moments without amplifying rounding error.
fn summarize(column: &[f32]) -> (f32, f32, f32, f32) {
    if column.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let n = column.len() as f64;
    let mean = column.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = column
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let min = column.iter().copied().fold(f32::INFINITY, f32::min);
    let max = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    (mean as f32, variance.max(0.0).sqrt() as f32, min, max)
}
