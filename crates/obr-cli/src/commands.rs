//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::time::Instant;

use comfy_table::{Cell, Color, Table};
use tracing::{error, info};

use obr_ingest::{PathLayout, SourceDocument};
use obr_model::{DataFormat, FULL_ADDR, STANDARD_FIELDS, is_address_field, is_force_field};
use obr_transform::{AddressParser, ProcessOptions, process};

use crate::summary::{DatasetOutcome, apply_table_style};

/// Processes every document in order. A failed dataset is recorded and the
/// next one still runs.
pub fn run_process(
    sources: &[PathBuf],
    options: &ProcessOptions,
    parser: &dyn AddressParser,
) -> Vec<DatasetOutcome> {
    let start = Instant::now();
    let outcomes: Vec<DatasetOutcome> = sources
        .iter()
        .map(|document| {
            let result = process(document, options, parser).map_err(|err| {
                error!(document = %document.display(), error = %err, "Dataset failed");
                error_chain(&err)
            });
            DatasetOutcome {
                document: document.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    info!(
        datasets = outcomes.len(),
        failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Run complete"
    );
    outcomes
}

/// Result of validating one metadata document.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub document: PathBuf,
    /// Format and declared file name, or the rendered error.
    pub result: Result<(DataFormat, String), String>,
}

/// Loads and validates every document without touching any data file.
pub fn run_validate(sources: &[PathBuf], layout: &PathLayout) -> Vec<ValidationOutcome> {
    sources
        .iter()
        .map(|document| ValidationOutcome {
            document: document.clone(),
            result: validate_one(document, layout),
        })
        .collect()
}

fn validate_one(document: &Path, layout: &PathLayout) -> Result<(DataFormat, String), String> {
    let source = SourceDocument::load(document)
        .and_then(|loaded| loaded.validate(layout))
        .map_err(|err| error_chain(&err))?;
    Ok((source.format(), source.metadata().file.clone()))
}

pub fn validation_table(outcomes: &[ValidationOutcome]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Source", "Format", "File", "Status"]);
    apply_table_style(&mut table);
    for outcome in outcomes {
        let row = match &outcome.result {
            Ok((format, file)) => vec![
                Cell::new(outcome.document.display()),
                Cell::new(format),
                Cell::new(file),
                Cell::new("valid").fg(Color::Green),
            ],
            Err(error) => vec![
                Cell::new(outcome.document.display()),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(error).fg(Color::Red),
            ],
        };
        table.add_row(row);
    }
    table
}

/// The standard vocabulary in output order.
pub fn fields_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Field", "Notes"]);
    apply_table_style(&mut table);
    for (index, field) in STANDARD_FIELDS.iter().enumerate() {
        let notes = match (is_address_field(field), is_force_field(field)) {
            (true, true) => "address, forceable",
            (true, false) => "address",
            (false, _) if *field == FULL_ADDR => "decomposed into address fields",
            _ => "",
        };
        table.add_row(vec![Cell::new(index + 1), Cell::new(field), Cell::new(notes)]);
    }
    table
}

/// Renders an error with its sources, `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
