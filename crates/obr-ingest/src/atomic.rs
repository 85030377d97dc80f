//! Atomic file output.
//!
//! Output is written to a sibling temp path and renamed over the real path
//! only when the whole write succeeded. An uncommitted temp file is removed
//! when the guard is dropped, so a failed step never leaves a half-written
//! canonical file behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Guard for a file being written through a temp path.
#[derive(Debug)]
pub struct AtomicFile {
    temp_path: PathBuf,
    target_path: PathBuf,
    committed: bool,
}

impl AtomicFile {
    /// Creates the temp file next to `target`, creating parent directories.
    pub fn create(target: &Path) -> Result<(Self, File)> {
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| IngestError::write(parent, e))?;
        }

        let temp_path = temp_path_for(target);
        let file = File::create(&temp_path).map_err(|e| IngestError::write(&temp_path, e))?;
        let guard = Self {
            temp_path,
            target_path: target.to_path_buf(),
            committed: false,
        };
        Ok((guard, file))
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Syncs `file` and renames the temp path over the target.
    pub fn commit(mut self, file: File) -> Result<()> {
        file.sync_all()
            .map_err(|e| IngestError::write(&self.temp_path, e))?;
        drop(file);

        fs::rename(&self.temp_path, &self.target_path).map_err(|e| {
            IngestError::AtomicWriteFailed {
                temp_path: self.temp_path.clone(),
                target_path: self.target_path.clone(),
                source: e,
            }
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if !self.committed
            && self.temp_path.exists()
            && let Err(e) = fs::remove_file(&self.temp_path)
        {
            tracing::warn!(
                path = %self.temp_path.display(),
                error = %e,
                "Failed to remove temp file"
            );
        }
    }
}

/// Sibling temp path: the target path with `.tmp` appended.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
