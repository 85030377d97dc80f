//! Source ingestion for the business-registry standardization engine.
//!
//! This crate takes a source from its metadata document to a structurally
//! sound, UTF-8 intermediate input ready for field extraction.
//!
//! # Features
//!
//! - **Metadata Validation**: Load a JSON source document and check it against
//!   the metadata schema before any data is touched
//! - **Path Layout**: Derive raw, dirty and clean paths under a data root
//! - **Encoding Detection**: Pick the first of utf-8, cp1252 and cp437 that
//!   decodes the raw file, unless the metadata declares one
//! - **CSV Repair**: Right-pad ragged rows and strip a byte-order mark
//! - **Retrieval**: Download a missing raw file from its declared URL
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use obr_ingest::{PathLayout, SourceDocument, detect_encoding, repair_csv};
//!
//! let layout = PathLayout::new("pddir");
//! let source = SourceDocument::load(Path::new("sources/bc.json"))?.validate(&layout)?;
//! source.ensure_raw_data()?;
//!
//! let paths = source.paths();
//! let encoding = detect_encoding(source.metadata().encoding.as_deref(), &paths.raw)?;
//! repair_csv(&paths.raw, &paths.dirty, encoding)?;
//! ```

mod atomic;
mod encoding;
mod error;
mod fetch;
mod layout;
mod repair;
mod schema;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === Metadata ===
pub use schema::{parse_metadata, validate_document};
pub use source::{Source, SourceDocument};

// === Paths ===
pub use layout::{
    CLEAN_DIR, DEFAULT_DATA_ROOT, DIRTY_DIR, PathLayout, RAW_DIR, SourcePaths, base_name,
};

// === Encoding ===
pub use encoding::{SUPPORTED_ENCODINGS, SourceEncoding, detect_encoding, read_decoded};

// === CSV Repair ===
pub use repair::{RepairReport, repair_csv};

// === Output ===
pub use atomic::{AtomicFile, temp_path_for};

// === Retrieval ===
pub use fetch::fetch_raw;
