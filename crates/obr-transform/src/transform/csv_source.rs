//! Record access for CSV sources.
//!
//! Reads the repaired intermediate file. Values are looked up by header
//! position, so cells beyond the header of an over-long row are ignored.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use obr_ingest::Source;
use obr_model::LabelMap;

use super::{RecordSink, TransformReport};
use crate::error::{Result, TransformError};
use crate::plan::{RecordAccess, RowPlan};

/// Header name to column index.
type ColumnIndex = HashMap<String, usize>;

struct CsvRecord<'a> {
    columns: &'a ColumnIndex,
    record: &'a StringRecord,
}

impl RecordAccess for CsvRecord<'_> {
    fn value(&self, path: &str) -> Option<&str> {
        self.columns
            .get(path)
            .and_then(|&index| self.record.get(index))
    }
}

pub(super) fn transform(
    source: &Source,
    label_map: &LabelMap,
    plan: &RowPlan,
    sink: &mut RecordSink<'_>,
) -> Result<TransformReport> {
    let path = &source.paths().dirty;
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TransformError::csv(path, e))?;

    // Duplicate header names resolve to their last column.
    let columns: ColumnIndex = reader
        .headers()
        .map_err(|e| TransformError::csv(path, e))?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), index))
        .collect();
    check_columns(label_map, &columns, path)?;

    let mut report = TransformReport::default();
    let mut record = StringRecord::new();
    while reader
        .read_record(&mut record)
        .map_err(|e| TransformError::csv(path, e))?
    {
        let access = CsvRecord {
            columns: &columns,
            record: &record,
        };
        sink.accept(plan, &access, &mut report)?;
    }
    Ok(report)
}

/// Fails with `FieldNotFound` unless every record locator names a column.
///
/// Every missing column is logged before the first one is returned.
fn check_columns(label_map: &LabelMap, columns: &ColumnIndex, path: &Path) -> Result<()> {
    let missing: Vec<(&str, &str)> = label_map
        .record_locators()
        .filter(|(_, locator)| !columns.contains_key(*locator))
        .collect();

    for (field, locator) in &missing {
        tracing::error!(
            field = *field,
            locator = *locator,
            path = %path.display(),
            "Column not found"
        );
    }

    match missing.first() {
        Some((field, locator)) => Err(TransformError::FieldNotFound {
            field: (*field).to_string(),
            locator: (*locator).to_string(),
            path: path.to_path_buf(),
        }),
        None => Ok(()),
    }
}
