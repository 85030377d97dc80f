//! The per-dataset processing pipeline.
//!
//! Steps run strictly in order: validate, make sure the raw file is present,
//! detect its encoding, repair (CSV only), build the label map, transform,
//! clean, and optionally blank fill. Any failure aborts the dataset.

use std::path::{Path, PathBuf};

use obr_ingest::{
    IngestError, PathLayout, RepairReport, Source, SourceDocument, SourceEncoding,
    detect_encoding, fetch_raw, repair_csv,
};
use obr_model::DataFormat;

use crate::address::AddressParser;
use crate::error::Result;
use crate::finalize::{BlankFillReport, blank_fill, clean};
use crate::labels::build_label_map;
use crate::transform::{TransformReport, Transformer};

/// Run settings shared by every dataset.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub layout: PathLayout,
    /// Download the raw file from its `url` when it is missing.
    pub fetch: bool,
    /// Complete the clean file to the full standard column set.
    pub blank_fill: bool,
}

/// What processing one dataset produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub file: String,
    pub format: DataFormat,
    pub encoding: SourceEncoding,
    /// Bytes downloaded, when the raw file was fetched.
    pub fetched: Option<u64>,
    pub repair: Option<RepairReport>,
    pub transform: TransformReport,
    pub blank_fill: Option<BlankFillReport>,
    pub clean_path: PathBuf,
}

/// Loads, validates and processes one metadata document.
pub fn process(
    document: &Path,
    options: &ProcessOptions,
    parser: &dyn AddressParser,
) -> Result<ProcessReport> {
    let span = tracing::info_span!("source", file = %document.display());
    let _guard = span.enter();

    let mut source = SourceDocument::load(document)?.validate(&options.layout)?;
    process_source(&mut source, options, parser)
}

/// Processes a validated source through to its clean file.
pub fn process_source(
    source: &mut Source,
    options: &ProcessOptions,
    parser: &dyn AddressParser,
) -> Result<ProcessReport> {
    let fetched = match source.ensure_raw_data() {
        Ok(()) => None,
        Err(IngestError::RawDataMissing { .. }) if options.fetch => Some(fetch_raw(source)?),
        Err(e) => return Err(e.into()),
    };

    let paths = source.paths().clone();
    let encoding = detect_encoding(source.metadata().encoding.as_deref(), &paths.raw)?;
    tracing::info!(encoding = %encoding, "Using character encoding");

    let repair = match source.format() {
        DataFormat::Csv => Some(repair_csv(&paths.raw, &paths.dirty, encoding)?),
        DataFormat::Xml => None,
    };

    let label_map = build_label_map(source.metadata());
    source.attach_label_map(label_map)?;

    let transform = Transformer::for_format(source.format()).run(source, encoding, parser)?;
    let clean_path = clean(source)?;
    let filled = if options.blank_fill {
        Some(blank_fill(source)?)
    } else {
        None
    };

    Ok(ProcessReport {
        file: source.metadata().file.clone(),
        format: source.format(),
        encoding,
        fetched,
        repair,
        transform,
        blank_fill: filled,
        clean_path,
    })
}
