// Error types for the cough analyzer
//
// This module defines custom error types for the analysis pipeline and the
// reference-corpus loaders, providing structured error handling with numeric
// error codes suitable for callers that cross a language boundary.

mod analysis;
mod corpus;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use corpus::{log_corpus_error, CorpusError, CorpusErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling for
/// callers that only see numbers and strings.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
