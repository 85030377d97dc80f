//! On-disk layout of the raw, intermediate and clean data directories.

use std::path::{Path, PathBuf};

/// Default data root, relative to the working directory.
pub const DEFAULT_DATA_ROOT: &str = "pddir";

pub const RAW_DIR: &str = "raw";
pub const DIRTY_DIR: &str = "dirty";
pub const CLEAN_DIR: &str = "clean";

/// Resolves dataset file names to paths under a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    root: PathBuf,
}

impl Default for PathLayout {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_ROOT)
    }
}

impl PathLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    pub fn dirty_dir(&self) -> PathBuf {
        self.root.join(DIRTY_DIR)
    }

    pub fn clean_dir(&self) -> PathBuf {
        self.root.join(CLEAN_DIR)
    }

    /// Derives the three file roles for a declared file name.
    pub fn paths_for(&self, file: &str) -> SourcePaths {
        let base = base_name(file);
        SourcePaths {
            raw: self.raw_dir().join(file),
            dirty: self.dirty_dir().join(format!("{base}-dirty.csv")),
            clean: self.clean_dir().join(format!("{base}-clean.csv")),
        }
    }
}

/// Raw, intermediate ("dirty") and clean paths of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub raw: PathBuf,
    pub dirty: PathBuf,
    pub clean: PathBuf,
}

/// Strips the last dot-extension from a file name.
///
/// A name without a dot is returned unchanged.
pub fn base_name(file: &str) -> &str {
    file.rsplit_once('.').map_or(file, |(base, _)| base)
}
