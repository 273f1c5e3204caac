// Cough Analyzer Core - spectral feature extraction and reference-corpus classification
// Synchronous, allocation-per-call DSP pipeline shared across threads behind Arc

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod corpus;
pub mod debug;
pub mod error;

// Re-exports for convenience
pub use analysis::classifier::{ClassificationResult, ConditionProbability, Confidence};
pub use analysis::{CancellationFlag, CoughAnalyzer};
pub use audio::AudioBuffer;
pub use config::AppConfig;
pub use corpus::ReferenceCorpus;
pub use error::{AnalysisError, CorpusError, ErrorCode};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_module_structure() {
        let corpus = Arc::new(ReferenceCorpus::load().unwrap());
        let analyzer = CoughAnalyzer::new(AppConfig::default(), corpus).unwrap();
        assert_eq!(analyzer.config().spectral.feature_len, 1024);
    }
}
