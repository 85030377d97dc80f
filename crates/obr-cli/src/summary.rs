//! Run summary tables.

use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use obr_transform::ProcessReport;

/// Result of processing one metadata document.
#[derive(Debug)]
pub struct DatasetOutcome {
    pub document: PathBuf,
    /// The report, or the rendered error chain.
    pub result: Result<ProcessReport, String>,
}

impl DatasetOutcome {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

pub fn print_summary(outcomes: &[DatasetOutcome]) {
    println!("{}", summary_table(outcomes));
    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|error| (&outcome.document, error))
        })
        .collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for (document, error) in failures {
            eprintln!("- {}: {error}", document.display());
        }
    }
}

/// One row per dataset plus a totals row.
pub fn summary_table(outcomes: &[DatasetOutcome]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Format"),
        header_cell("Encoding"),
        header_cell("Written"),
        header_cell("Dropped"),
        header_cell("Output"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    let mut total_written = 0usize;
    let mut total_dropped = 0usize;
    let mut failed = 0usize;
    for outcome in outcomes {
        let source = Cell::new(outcome.document.display());
        match &outcome.result {
            Ok(report) => {
                total_written += report.transform.rows_written;
                total_dropped += report.transform.rows_dropped;
                table.add_row(vec![
                    source,
                    Cell::new(report.format),
                    Cell::new(report.encoding),
                    Cell::new(report.transform.rows_written),
                    count_cell(report.transform.rows_dropped),
                    Cell::new(report.clean_path.display()).fg(Color::Green),
                ]);
            }
            Err(error) => {
                failed += 1;
                table.add_row(vec![
                    source,
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    Cell::new(error).fg(Color::Red),
                ]);
            }
        }
    }

    let status = if failed == 0 {
        dim_cell("all succeeded")
    } else {
        Cell::new(format!("{failed} failed"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    };
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(total_written).add_attribute(Attribute::Bold),
        count_cell(total_dropped).add_attribute(Attribute::Bold),
        status,
    ]);
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Yellow)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
