//! Structural repair of raw CSV files.
//!
//! Produces a structurally uniform intermediate CSV: rows shorter than the
//! first row are right-padded with empty strings, and a byte-order mark left
//! on the first cell by the decoder is stripped. Rows longer than the first
//! row are passed through unmodified.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::atomic::AtomicFile;
use crate::encoding::{SourceEncoding, read_decoded};
use crate::error::{IngestError, Result};

const BOM: char = '\u{feff}';

/// Outcome of a repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Rows written, header included.
    pub rows: usize,
    /// Column count fixed by the first row.
    pub width: usize,
    /// Rows that were right-padded.
    pub padded_rows: usize,
    /// Rows longer than `width`, written unchanged.
    pub long_rows: usize,
    /// Whether a byte-order mark was removed.
    pub bom_stripped: bool,
}

/// Reads `raw` in `encoding` and writes the repaired, UTF-8 CSV to `dirty`.
pub fn repair_csv(raw: &Path, dirty: &Path, encoding: SourceEncoding) -> Result<RepairReport> {
    let text = read_decoded(raw, encoding)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let (output, file) = AtomicFile::create(dirty)?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(file);

    let mut report = RepairReport::default();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| IngestError::csv(raw, e))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();

        if index == 0 {
            if let Some(first) = row.first_mut()
                && let Some(stripped) = first.strip_prefix(BOM)
            {
                *first = stripped.to_string();
                report.bom_stripped = true;
            }
            report.width = row.len();
        } else if row.len() < report.width {
            row.resize(report.width, String::new());
            report.padded_rows += 1;
        } else if row.len() > report.width {
            tracing::warn!(
                path = %raw.display(),
                row = index + 1,
                width = report.width,
                cells = row.len(),
                "Row is longer than the header; passed through unmodified"
            );
            report.long_rows += 1;
        }

        writer
            .write_record(&row)
            .map_err(|e| IngestError::csv(dirty, e))?;
        report.rows += 1;
    }

    let file = writer
        .into_inner()
        .map_err(|e| IngestError::write(output.temp_path(), e.into_error()))?;
    output.commit(file)?;

    tracing::info!(
        raw = %raw.display(),
        dirty = %dirty.display(),
        encoding = %encoding,
        rows = report.rows,
        padded = report.padded_rows,
        long = report.long_rows,
        "Repaired CSV structure"
    );
    Ok(report)
}
