//! Error types for source ingestion.

use std::path::PathBuf;

use obr_model::{LifecycleError, SchemaError};
use thiserror::Error;

/// Errors that can occur while loading and preparing a source.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Metadata Errors ===
    /// Metadata document does not exist.
    #[error("source document not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Metadata document is not valid JSON.
    #[error("failed to parse source document {path}: {source}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Metadata document failed validation.
    #[error("invalid source document {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// Lifecycle step attempted out of order.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    // === File System Errors ===
    /// Raw dataset is absent from the raw directory.
    #[error("'{file}' not found in raw folder: {path}")]
    RawDataMissing { file: String, path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file could not be renamed over the target.
    #[error("failed to move {temp_path} into place at {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Encoding Errors ===
    /// Metadata declares an encoding outside the supported set.
    #[error("{encoding} is not a valid encoding")]
    InvalidEncoding { encoding: String },

    /// No supported encoding decodes the raw file.
    #[error("could not guess original character encoding of {path}")]
    EncodingDetectionFailed { path: PathBuf },

    /// File contents are not valid in the chosen encoding.
    #[error("{path} is not valid {encoding}")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    // === CSV Errors ===
    /// Failed to read or write CSV records.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // === Retrieval Errors ===
    /// Metadata has no URL to fetch from.
    #[error("source document for '{file}' has no 'url' tag")]
    MissingUrl { file: String },

    /// Download failed.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl IngestError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// The schema error, when validation failed.
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            Self::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
