//! Error types for pdf-atomizer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for atomizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while exploding, exporting or rebuilding a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version in the header is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and requires a password.
    #[error("Document is encrypted")]
    Encrypted,

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// A single explode step failed while running in strict mode.
    #[error("Extraction step '{step}' failed: {message}")]
    Step {
        /// Name of the failing step
        step: &'static str,
        /// Failure description
        message: String,
    },

    /// `explode()` was called on an atomizer whose store is already populated.
    #[error("Atom store has already been populated")]
    AlreadyExploded,

    /// Error during serialization (JSON, YAML).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error while writing the rebuilt document.
    #[error("Rebuild error: {0}")]
    Rebuild(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Render(format!("YAML serialization error: {}", err))
    }
}
