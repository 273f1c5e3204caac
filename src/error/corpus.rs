// Reference corpus and model loading errors

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Corpus error code constants
///
/// Error code range: 4001-4004
pub struct CorpusErrorCodes {}

impl CorpusErrorCodes {
    /// File could not be read
    pub const IO: i32 = 4001;

    /// JSON could not be parsed
    pub const PARSE: i32 = 4002;

    /// Parsed data violates a corpus or model invariant
    pub const INVALID: i32 = 4003;

    /// Corpus contains no reference samples
    pub const EMPTY: i32 = 4004;
}

/// Log a corpus error with structured context
pub fn log_corpus_error(err: &CorpusError, context: &str) {
    error!(
        "Corpus error in {}: code={}, component=ReferenceCorpus, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading the reference corpus or an exported cough model
#[derive(Debug, Clone, PartialEq)]
pub enum CorpusError {
    /// Reading the source file failed
    Io { path: String, reason: String },

    /// Source is not valid JSON for the expected schema
    Parse { reason: String },

    /// Source parsed but failed validation
    Invalid { reason: String },

    /// Source contained no samples
    Empty,
}

impl CorpusError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CorpusError::Invalid {
            reason: reason.into(),
        }
    }
}

impl ErrorCode for CorpusError {
    fn code(&self) -> i32 {
        match self {
            CorpusError::Io { .. } => CorpusErrorCodes::IO,
            CorpusError::Parse { .. } => CorpusErrorCodes::PARSE,
            CorpusError::Invalid { .. } => CorpusErrorCodes::INVALID,
            CorpusError::Empty => CorpusErrorCodes::EMPTY,
        }
    }

    fn message(&self) -> String {
        match self {
            CorpusError::Io { path, reason } => format!("Failed to read {}: {}", path, reason),
            CorpusError::Parse { reason } => format!("Failed to parse JSON: {}", reason),
            CorpusError::Invalid { reason } => format!("Invalid corpus data: {}", reason),
            CorpusError::Empty => "Reference corpus contains no samples".to_string(),
        }
    }
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CorpusError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CorpusError {}

impl From<serde_json::Error> for CorpusError {
    fn from(err: serde_json::Error) -> Self {
        CorpusError::Parse {
            reason: err.to_string(),
        }
    }
}
