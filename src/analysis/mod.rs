// Analysis module - cough classification pipeline
//
// This module orchestrates the complete analysis of one recording:
//
//   AudioBuffer → AudioPreprocessor → FeatureExtractor → CoughDetector
//               → Classifier (against the shared ReferenceCorpus)
//               → ClassificationResult
//
// Every stage is synchronous and CPU-bound. A CoughAnalyzer holds only
// read-only state after construction, so one instance (and one corpus behind
// an Arc) can serve any number of threads without locks. Batches run either
// sequentially or on scoped worker threads; both preserve input order and
// check a CancellationFlag before starting each buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::audio::{AudioBuffer, AudioPreprocessor};
use crate::config::AppConfig;
use crate::corpus::ReferenceCorpus;
use crate::debug::{pipeline_tracer, PipelineStage};
use crate::error::{log_analysis_error, AnalysisError};
use crate::trace_pipeline;

pub mod classifier;
pub mod clock;
pub mod cough_gate;
pub mod features;
pub mod similarity;
pub mod svm;

use classifier::{ClassificationResult, Classifier};
use clock::Clock;
use cough_gate::{CoughDecision, CoughDetector, CoughGate};
use features::{FeatureExtractor, FeatureVector};
use svm::SvmCoughModel;

/// Cooperative cancellation for batch analysis
///
/// Cloning shares the flag. Cancellation is only observed before a buffer
/// starts; a buffer already in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of buffers that have not started yet
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// End-to-end cough analyzer
///
/// Construction validates the configuration and prepares every stage (FFT
/// plan, mel filterbank, detector); analysis never loads anything lazily.
pub struct CoughAnalyzer {
    config: AppConfig,
    corpus: Arc<ReferenceCorpus>,
    preprocessor: AudioPreprocessor,
    extractor: FeatureExtractor,
    /// `None` when the cough gate is disabled
    detector: Option<Arc<dyn CoughDetector>>,
    classifier: Classifier,
}

impl CoughAnalyzer {
    /// Create an analyzer over a shared corpus
    ///
    /// # Arguments
    /// * `config` - Validated pipeline configuration
    /// * `corpus` - Reference corpus shared with other analyzers
    ///
    /// # Returns
    /// Ready analyzer, or `AnalysisError::InvalidConfig` when the config fails
    /// validation or the configured SVM model cannot be used
    pub fn new(config: AppConfig, corpus: Arc<ReferenceCorpus>) -> Result<Self, AnalysisError> {
        config
            .validate()
            .inspect_err(|err| log_analysis_error(err, "CoughAnalyzer::new"))?;

        let sample_rate = config.preprocess.target_sample_rate;
        let detector: Option<Arc<dyn CoughDetector>> = if !config.cough_gate.enabled {
            None
        } else if let Some(path) = &config.cough_gate.svm_model_path {
            let model = SvmCoughModel::load_from_file(path).map_err(|err| {
                AnalysisError::invalid_config(format!("cough model {}: {}", path.display(), err))
            })?;
            Some(Arc::new(checked_svm(model, config.spectral.feature_len)?))
        } else {
            Some(Arc::new(CoughGate::new(config.cough_gate.clone())))
        };

        if corpus.is_empty() {
            log::warn!("CoughAnalyzer created with an empty reference corpus");
        }
        log::info!(
            "CoughAnalyzer ready: {} Hz, {} mel bands, {} reference samples, gate={}",
            sample_rate,
            config.spectral.mel_bands,
            corpus.len(),
            match (&detector, &config.cough_gate.svm_model_path) {
                (None, _) => "disabled",
                (Some(_), Some(_)) => "svm",
                (Some(_), None) => "heuristic",
            }
        );

        Ok(Self {
            preprocessor: AudioPreprocessor::new(sample_rate),
            extractor: FeatureExtractor::new(sample_rate, &config.spectral),
            classifier: Classifier::new(config.similarity.clone(), config.classifier.clone()),
            detector,
            corpus,
            config,
        })
    }

    /// Replace the timestamp source of produced results
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.classifier = self.classifier.with_clock(clock);
        self
    }

    /// Use an already-loaded SVM model as the cough detector
    pub fn with_svm_model(mut self, model: SvmCoughModel) -> Result<Self, AnalysisError> {
        self.detector = Some(Arc::new(checked_svm(model, self.config.spectral.feature_len)?));
        Ok(self)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Arc<ReferenceCorpus> {
        &self.corpus
    }

    /// Preprocess a buffer and extract its feature vector
    pub fn extract_features(&self, buffer: &AudioBuffer) -> Result<FeatureVector, AnalysisError> {
        let mono = self.preprocessor.normalize(buffer)?;
        pipeline_tracer::trace_preprocess(
            buffer.frames(),
            buffer.channels(),
            buffer.sample_rate(),
            mono.samples().len(),
        );
        Ok(self.extractor.extract(mono.samples()))
    }

    /// Run the cough gate on a feature vector, if enabled
    pub fn detect_cough(&self, features: &FeatureVector) -> Option<CoughDecision> {
        let decision = self.detector.as_ref()?.evaluate(features);
        pipeline_tracer::trace_gate(
            decision.score,
            self.config.cough_gate.threshold,
            decision.is_cough,
        );
        Some(decision)
    }

    /// Classify one recording
    ///
    /// # Returns
    /// - Corpus classification when the input passes the cough gate
    /// - The fixed "No cough detected" result when the gate rejects it
    /// - `InvalidInput` for unusable buffers, `ModelNotLoaded` for an empty corpus
    pub fn analyze(&self, buffer: &AudioBuffer) -> Result<ClassificationResult, AnalysisError> {
        self.analyze_inner(buffer)
            .inspect_err(|err| log_analysis_error(err, "CoughAnalyzer::analyze"))
    }

    fn analyze_inner(&self, buffer: &AudioBuffer) -> Result<ClassificationResult, AnalysisError> {
        let features = self.extract_features(buffer)?;

        if self.corpus.is_empty() {
            return Err(AnalysisError::ModelNotLoaded);
        }

        let decision = self.detect_cough(&features);
        if let Some(decision) = decision.filter(|d| !d.is_cough) {
            tracing::debug!(
                "[CoughAnalyzer] Gate rejected input (score {:.3})",
                decision.score
            );
            return Ok(self.classifier.no_cough_result(
                &self.corpus,
                self.config.cough_gate.fallback_probability,
                decision,
            ));
        }

        let mut result = self.classifier.classify(features.descriptor(), &self.corpus)?;
        if let Some(best) = result.top_matches.first() {
            trace_pipeline!(
                PipelineStage::Similarity,
                "matches={} best={} similarity={:.3}",
                result.top_matches.len(),
                best.sample_id,
                best.similarity
            );
        }
        result.cough_detection = decision;

        let dominant_probability = result
            .conditions
            .first()
            .map(|c| c.probability)
            .unwrap_or(0.0);
        pipeline_tracer::trace_classification(
            &result.dominant_condition,
            dominant_probability,
            result.conditions.len(),
        );
        Ok(result)
    }

    /// Analyze buffers one after another
    ///
    /// # Returns
    /// One result per input, in input order. Buffers not started when
    /// `cancel` fires yield `AnalysisError::Cancelled`.
    pub fn analyze_batch(
        &self,
        buffers: &[AudioBuffer],
        cancel: Option<&CancellationFlag>,
    ) -> Vec<Result<ClassificationResult, AnalysisError>> {
        buffers
            .iter()
            .map(|buffer| self.analyze_unless_cancelled(buffer, cancel))
            .collect()
    }

    /// Analyze buffers on up to `workers` scoped threads
    ///
    /// Each worker takes a contiguous chunk; chunks are joined in order, so the
    /// output matches `analyze_batch` for the same input.
    pub fn analyze_batch_parallel(
        &self,
        buffers: &[AudioBuffer],
        workers: usize,
        cancel: Option<&CancellationFlag>,
    ) -> Vec<Result<ClassificationResult, AnalysisError>> {
        if buffers.is_empty() {
            return Vec::new();
        }
        let workers = workers.clamp(1, buffers.len());
        if workers == 1 {
            return self.analyze_batch(buffers, cancel);
        }
        let chunk_size = buffers.len().div_ceil(workers);

        tracing::debug!(
            "[CoughAnalyzer] Parallel batch: {} buffers on {} workers",
            buffers.len(),
            workers
        );

        thread::scope(|scope| {
            let handles: Vec<_> = buffers
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.analyze_batch(chunk, cancel)))
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    fn analyze_unless_cancelled(
        &self,
        buffer: &AudioBuffer,
        cancel: Option<&CancellationFlag>,
    ) -> Result<ClassificationResult, AnalysisError> {
        if cancel.is_some_and(CancellationFlag::is_cancelled) {
            return Err(AnalysisError::Cancelled);
        }
        self.analyze(buffer)
    }
}

/// Reject an SVM whose input size differs from the feature vector length
fn checked_svm(model: SvmCoughModel, feature_len: usize) -> Result<SvmCoughModel, AnalysisError> {
    if model.dimension() != feature_len {
        return Err(AnalysisError::invalid_config(format!(
            "cough model expects {} features but feature_len is {}",
            model.dimension(),
            feature_len
        )));
    }
    Ok(model)
}
