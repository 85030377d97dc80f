//! Error types for record transformation.

use std::path::PathBuf;

use obr_ingest::IngestError;
use obr_model::{ElementPathError, LifecycleError, SourceState};
use thiserror::Error;

use crate::address::AddressParseError;

/// Errors that can occur while transforming a source into the standard schema.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A step before transformation failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A declared CSV column does not exist in the intermediate file.
    #[error("field '{field}': column '{locator}' not found in {path}")]
    FieldNotFound {
        field: String,
        locator: String,
        path: PathBuf,
    },

    /// A declared XML locator is not a valid element path.
    #[error("field '{field}': {source}")]
    InvalidLocator {
        field: String,
        #[source]
        source: ElementPathError,
    },

    /// Transformation ran before a label map was attached.
    #[error("no label map attached to source {path}")]
    LabelMapMissing { path: PathBuf },

    /// Step attempted in the wrong lifecycle state.
    #[error("source is {found}, expected {expected}")]
    InvalidState {
        expected: SourceState,
        found: SourceState,
    },

    /// The external address parser failed.
    #[error(transparent)]
    AddressParse(#[from] AddressParseError),

    /// Raw XML is not well formed.
    #[error("XML error in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    /// Failed to read or write CSV records.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<LifecycleError> for TransformError {
    fn from(err: LifecycleError) -> Self {
        Self::InvalidState {
            expected: err.expected,
            found: err.found,
        }
    }
}

impl TransformError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, source: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid_locator(field: &str, source: ElementPathError) -> Self {
        Self::InvalidLocator {
            field: field.to_string(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors raised by a missing CSV column.
    pub fn is_field_not_found(&self) -> bool {
        matches!(self, Self::FieldNotFound { .. })
    }
}

/// Result type for transformation operations.
pub type Result<T> = std::result::Result<T, TransformError>;
