//! Unified error types for the deckforge pipeline.
//!
//! Every stage of the pipeline (classification, template analysis, content
//! validation, deck assembly) reports failures through this one error type,
//! presenting a consistent API to both the library and the CLI.

use thiserror::Error;

/// Main error type for deckforge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Package part or file not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Content failed deterministic validation with fatal findings
    #[error("Validation failed: {0} fatal finding(s)")]
    ValidationFailed(usize),

    /// A slide or layout index was outside the valid range
    #[error("Index {index} out of range (valid: 0-{max})")]
    IndexOutOfRange { index: usize, max: usize },

    /// Naming convention violation
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// A write would land in a directory the pipeline reserves for inputs
    #[error("Refusing to write into the input directory: {0}")]
    ReservedDirectory(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for Error {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

/// Result type for deckforge operations.
pub type Result<T> = std::result::Result<T, Error>;
