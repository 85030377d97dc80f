//! Passes run after transformation: clean and blank fill.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use obr_ingest::{AtomicFile, Source};
use obr_model::{SourceState, blank_fill_columns};

use crate::error::{Result, TransformError};

/// Moves the intermediate file to the clean path.
///
/// No cleaning rules are applied yet; the clean file is the intermediate
/// file as written by the transformer.
pub fn clean(source: &mut Source) -> Result<PathBuf> {
    source.require_state(SourceState::Transformed)?;
    let dirty = source.paths().dirty.clone();
    let clean = source.paths().clean.clone();

    if let Some(parent) = clean.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| TransformError::write(parent, e))?;
    }
    fs::rename(&dirty, &clean).map_err(|e| TransformError::write(&clean, e))?;
    source.mark_cleaned()?;

    tracing::info!(path = %clean.display(), "Wrote clean file");
    Ok(clean)
}

/// Outcome of a blank-fill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlankFillReport {
    /// Standard columns that were absent and added empty.
    pub columns_added: usize,
    pub rows: usize,
}

/// Completes a cleaned source's file to the full standard column set.
pub fn blank_fill(source: &Source) -> Result<BlankFillReport> {
    source.require_state(SourceState::Cleaned)?;
    blank_fill_file(&source.paths().clean)
}

/// Rewrites a standardized file with every standard column, in vocabulary
/// order, leaving the cells of absent columns empty.
pub fn blank_fill_file(path: &Path) -> Result<BlankFillReport> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TransformError::csv(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| TransformError::csv(path, e))?
        .clone();

    let positions: Vec<Option<usize>> = blank_fill_columns()
        .map(|column| headers.iter().position(|name| name == column))
        .collect();
    let mut report = BlankFillReport {
        columns_added: positions.iter().filter(|position| position.is_none()).count(),
        rows: 0,
    };

    let (output, file) = AtomicFile::create(path)?;
    let temp_path = output.temp_path().to_path_buf();
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(file);
    writer
        .write_record(blank_fill_columns())
        .map_err(|e| TransformError::csv(&temp_path, e))?;

    let mut record = StringRecord::new();
    while reader
        .read_record(&mut record)
        .map_err(|e| TransformError::csv(path, e))?
    {
        let row = positions
            .iter()
            .map(|position| position.and_then(|index| record.get(index)).unwrap_or_default());
        writer
            .write_record(row)
            .map_err(|e| TransformError::csv(&temp_path, e))?;
        report.rows += 1;
    }
    drop(reader);

    let file = writer
        .into_inner()
        .map_err(|e| TransformError::write(&temp_path, e.into_error()))?;
    output.commit(file)?;

    tracing::info!(
        path = %path.display(),
        added = report.columns_added,
        rows = report.rows,
        "Blank-filled standard columns"
    );
    Ok(report)
}
