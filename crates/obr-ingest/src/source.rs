//! Source datasets and their lifecycle.

use std::path::{Path, PathBuf};

use obr_model::{DataFormat, LabelMap, LifecycleError, SourceMetadata, SourceState};
use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::layout::{PathLayout, SourcePaths};
use crate::schema::parse_metadata;

/// A metadata document that has been loaded but not yet validated.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    document: Value,
}

impl SourceDocument {
    /// Loads a metadata document from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IngestError::SourceNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                IngestError::read(path, e)
            }
        })?;
        let document = serde_json::from_str(&contents).map_err(|e| IngestError::DocumentParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_value(path, document))
    }

    /// Wraps an already-parsed document.
    pub fn from_value(path: impl Into<PathBuf>, document: Value) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn state(&self) -> SourceState {
        SourceState::Constructed
    }

    /// Validates the document and assigns the dataset's file paths.
    pub fn validate(self, layout: &PathLayout) -> Result<Source> {
        let metadata = parse_metadata(&self.document).map_err(|e| IngestError::Schema {
            path: self.path.clone(),
            source: e,
        })?;
        let paths = layout.paths_for(&metadata.file);

        tracing::debug!(
            source = %self.path.display(),
            format = %metadata.format,
            raw = %paths.raw.display(),
            dirty = %paths.dirty.display(),
            clean = %paths.clean.display(),
            "Validated source document"
        );

        Ok(Source {
            document_path: self.path,
            metadata,
            paths,
            label_map: None,
            state: SourceState::Validated,
        })
    }
}

/// A validated dataset: its metadata, file paths and label map.
///
/// Paths never change once assigned. The label map is attached exactly once.
#[derive(Debug, Clone)]
pub struct Source {
    document_path: PathBuf,
    metadata: SourceMetadata,
    paths: SourcePaths,
    label_map: Option<LabelMap>,
    state: SourceState,
}

impl Source {
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    pub fn format(&self) -> DataFormat {
        self.metadata.format
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Label map, present once extraction has run.
    pub fn label_map(&self) -> Option<&LabelMap> {
        self.label_map.as_ref()
    }

    /// Attaches the label map built for this source.
    pub fn attach_label_map(
        &mut self,
        label_map: LabelMap,
    ) -> std::result::Result<(), LifecycleError> {
        self.advance(SourceState::Validated)?;
        self.label_map = Some(label_map);
        Ok(())
    }

    /// Records that the intermediate file has been written.
    pub fn mark_transformed(&mut self) -> std::result::Result<(), LifecycleError> {
        self.advance(SourceState::LabelMapped)
    }

    /// Records that the clean file has been written.
    pub fn mark_cleaned(&mut self) -> std::result::Result<(), LifecycleError> {
        self.advance(SourceState::Transformed)
    }

    /// Fails unless the source is currently in `expected`.
    pub fn require_state(&self, expected: SourceState) -> std::result::Result<(), LifecycleError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LifecycleError {
                expected,
                found: self.state,
            })
        }
    }

    fn advance(&mut self, from: SourceState) -> std::result::Result<(), LifecycleError> {
        self.require_state(from)?;
        if let Some(next) = from.next() {
            self.state = next;
        }
        Ok(())
    }

    /// Checks that the raw dataset exists in the raw directory.
    pub fn ensure_raw_data(&self) -> Result<()> {
        if self.paths.raw.is_file() {
            Ok(())
        } else {
            Err(IngestError::RawDataMissing {
                file: self.metadata.file.clone(),
                path: self.paths.raw.clone(),
            })
        }
    }
}
