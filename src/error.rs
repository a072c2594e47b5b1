//! Centralized error types for emlview.
//!
//! Parsing itself never fails: [`crate::parser::eml::parse_message`] always
//! returns a best-effort [`crate::model::email::ParsedEmail`]. These errors
//! cover the caller-side boundary only: reading files, validating input,
//! writing exports.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the emlview library.
#[derive(Error, Debug)]
pub enum EmlError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("EML file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file does not carry an `.eml` extension.
    #[error("Not an .eml file: {0}")]
    NotAnEmlFile(PathBuf),
}

/// Convenience alias for `Result<T, EmlError>`.
pub type Result<T> = std::result::Result<T, EmlError>;

impl EmlError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `EmlError`
/// when no path context is available (rare — prefer `EmlError::io`).
impl From<std::io::Error> for EmlError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
