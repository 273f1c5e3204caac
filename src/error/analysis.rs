// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Single source of truth for the numeric codes reported by
/// [`AnalysisError::code`].
///
/// Error code range: 3001-3004
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Audio buffer is empty, has no channels or contains non-finite samples
    pub const INVALID_INPUT: i32 = 3001;

    /// Classification attempted without a loaded reference corpus
    pub const MODEL_NOT_LOADED: i32 = 3002;

    /// Analyzer configuration violates an invariant
    pub const INVALID_CONFIG: i32 = 3003;

    /// Batch item abandoned before it started
    pub const CANCELLED: i32 = 3004;
}

/// Log an analysis error with structured context
///
/// Logs the numeric code, the component and the human-readable message.
/// The logging is non-blocking and will not panic on failure.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=CoughAnalyzer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the analysis pipeline
///
/// All errors are raised synchronously before (or instead of) producing a
/// classification. The pipeline is deterministic, so none of them are
/// worth retrying with the same input.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Audio buffer rejected before any transform ran
    InvalidInput { reason: String },

    /// Reference corpus is empty (never loaded)
    ModelNotLoaded,

    /// Configuration rejected by validation
    InvalidConfig { reason: String },

    /// Batch item skipped because cancellation was requested
    Cancelled,
}

impl AnalysisError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidInput { .. } => AnalysisErrorCodes::INVALID_INPUT,
            AnalysisError::ModelNotLoaded => AnalysisErrorCodes::MODEL_NOT_LOADED,
            AnalysisError::InvalidConfig { .. } => AnalysisErrorCodes::INVALID_CONFIG,
            AnalysisError::Cancelled => AnalysisErrorCodes::CANCELLED,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidInput { reason } => {
                format!("Invalid audio input: {}", reason)
            }
            AnalysisError::ModelNotLoaded => {
                "Reference corpus not loaded. Build the analyzer with a loaded ReferenceCorpus."
                    .to_string()
            }
            AnalysisError::InvalidConfig { reason } => {
                format!("Invalid analyzer configuration: {}", reason)
            }
            AnalysisError::Cancelled => "Analysis cancelled before it started".to_string(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
