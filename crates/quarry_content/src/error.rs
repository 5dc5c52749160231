//! Error types for import staging

use std::path::PathBuf;
use thiserror::Error;

/// Result type for staging operations
pub type StagingResult<T> = std::result::Result<T, StagingError>;

/// Errors surfaced synchronously by the staging layer
#[derive(Debug, Error)]
pub enum StagingError {
    /// Destination folder is empty, missing, or outside the content root
    #[error("Invalid destination folder '{folder}': {reason}")]
    InvalidDestination {
        folder: String,
        reason: String,
    },

    /// Source file does not exist or cannot be resolved
    #[error("Source file not found: {0:?}")]
    MissingSource(PathBuf),

    /// Content root of the project does not exist
    #[error("Invalid content root {0:?}")]
    InvalidContentRoot(PathBuf),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Import runtime could not be created
    #[error("Failed to start import runtime: {0}")]
    Runtime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    /// Create an invalid destination error
    pub fn invalid_destination(folder: impl Into<String>, reason: impl Into<String>) -> Self {
        StagingError::InvalidDestination {
            folder: folder.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for import jobs
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Errors reported out-of-band by import jobs
#[derive(Debug, Error)]
pub enum ImportError {
    /// The request names no usable source
    #[error("Import request for {0:?} has no sources")]
    NoSources(PathBuf),

    /// Destination folder is not writable or missing
    #[error("Destination unavailable '{folder}': {message}")]
    Destination {
        folder: String,
        message: String,
    },

    /// Conversion of the source failed
    #[error("Failed to import {path:?}: {message}")]
    Failed {
        path: PathBuf,
        message: String,
    },

    /// Manifest serialization failed
    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Create a conversion failure
    pub fn failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ImportError::Failed {
            path: path.into(),
            message: message.into(),
        }
    }
}
