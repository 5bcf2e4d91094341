//! Error types for pipelines, record parsing and variant lookup.

use thiserror::Error;

/// Result type alias using the library's error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while building or running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A named variant lookup found no match.
    #[error("No {kind} variant named '{name}'")]
    UnknownVariant { kind: &'static str, name: String },

    /// Pipeline text could not be parsed.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An employee data line could not be parsed.
    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    /// A salary literal was malformed.
    #[error("Invalid salary: {0}")]
    InvalidSalary(String),

    #[error("Pipeline is empty")]
    EmptyPipeline,

    #[error("Pipeline must have at least 2 stages")]
    TooFewStages,

    /// The first stage cannot produce records.
    #[error("{0} cannot be the first stage (try CONSOLE, LITERAL, or HOLE)")]
    InvalidSource(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            line,
            message: message.into(),
        }
    }
}
