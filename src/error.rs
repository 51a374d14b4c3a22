//! Error types for the filter subsystem

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing, normalizing or compiling filter expressions.
///
/// Syntax and semantic variants are caused by user input and map to a
/// client-facing failure in the calling layer; `NotImplemented` indicates a
/// gap between the filter language and a backend's capability and must be
/// treated as a server-side defect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Field '{field}' is not accepted as a filter field")]
    UnacceptedFilterField { field: String },

    #[error("Operator '{operator}' is not accepted for filter field '{field}'")]
    UnacceptedFilterOperation { field: String, operator: String },

    #[error("Unknown field '{path}'")]
    UnknownField { path: String },

    #[error("Not implemented for {backend} backend: {detail}")]
    NotImplemented { backend: String, detail: String },
}

impl Error {
    /// Compiler-gap error naming the backend and the unsupported construct.
    pub fn not_implemented(backend: &str, detail: impl Into<String>) -> Self {
        Error::NotImplemented {
            backend: backend.to_string(),
            detail: detail.into(),
        }
    }
}
