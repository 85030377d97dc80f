//! Record transformation into the standard schema.
//!
//! The two formats share the row resolution in [`RowPlan`]; they differ only
//! in how records are read. The variant is chosen once per dataset from its
//! validated format.

mod csv_source;
mod xml_source;
pub mod xml_tree;

use std::fs::File;
use std::path::PathBuf;

use csv::{QuoteStyle, Writer, WriterBuilder};
use obr_ingest::{AtomicFile, Source, SourceEncoding};
use obr_model::{DataFormat, SourceState};

use crate::address::{AddressDecomposer, AddressParser};
use crate::error::{Result, TransformError};
use crate::plan::{RecordAccess, RowPlan};

/// Row counts of one transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub rows_written: usize,
    /// Records dropped because every cell was empty.
    pub rows_dropped: usize,
    pub columns: usize,
}

impl TransformReport {
    /// Source records seen.
    pub fn records(&self) -> usize {
        self.rows_written + self.rows_dropped
    }
}

/// Record transformer, one variant per source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    /// Reads the repaired intermediate CSV by column name.
    Csv,
    /// Reads the raw XML by element path from each record element.
    Xml,
}

impl Transformer {
    pub fn for_format(format: DataFormat) -> Self {
        match format {
            DataFormat::Csv => Transformer::Csv,
            DataFormat::Xml => Transformer::Xml,
        }
    }

    /// Writes the standardized intermediate file for a label-mapped source.
    ///
    /// Output goes to a temp file renamed over the intermediate path only
    /// once every record has been written. `encoding` is the raw file's
    /// encoding; CSV sources read the UTF-8 intermediate file instead.
    pub fn run(
        self,
        source: &mut Source,
        encoding: SourceEncoding,
        parser: &dyn AddressParser,
    ) -> Result<TransformReport> {
        source.require_state(SourceState::LabelMapped)?;
        let label_map = source
            .label_map()
            .ok_or_else(|| TransformError::LabelMapMissing {
                path: source.document_path().to_path_buf(),
            })?;
        let plan = RowPlan::new(label_map, source.metadata());
        let header = plan.header();
        tracing::debug!(columns = ?header, "Output header");

        let target = source.paths().dirty.clone();
        let (output, file) = AtomicFile::create(&target)?;
        let mut sink = RecordSink::new(file, output.temp_path().to_path_buf(), parser);
        sink.write_header(&header)?;

        let mut report = match self {
            Transformer::Csv => csv_source::transform(source, label_map, &plan, &mut sink)?,
            Transformer::Xml => {
                xml_source::transform(source, label_map, encoding, &plan, &mut sink)?
            }
        };
        report.columns = header.len();

        let file = sink.finish()?;
        output.commit(file)?;
        source.mark_transformed()?;

        tracing::info!(
            path = %target.display(),
            rows = report.rows_written,
            dropped = report.rows_dropped,
            columns = report.columns,
            "Transformed records"
        );
        Ok(report)
    }
}

/// Writes resolved rows to the standardized output, all fields quoted.
pub(crate) struct RecordSink<'a> {
    writer: Writer<File>,
    path: PathBuf,
    decomposer: AddressDecomposer<'a>,
}

impl<'a> RecordSink<'a> {
    fn new(file: File, path: PathBuf, parser: &'a dyn AddressParser) -> Self {
        Self {
            writer: WriterBuilder::new()
                .quote_style(QuoteStyle::Always)
                .from_writer(file),
            path,
            decomposer: AddressDecomposer::new(parser),
        }
    }

    fn write_header(&mut self, header: &[&str]) -> Result<()> {
        self.writer
            .write_record(header)
            .map_err(|e| TransformError::csv(&self.path, e))
    }

    /// Resolves a record and writes it unless it is empty.
    pub(crate) fn accept<R>(
        &mut self,
        plan: &RowPlan,
        record: &R,
        report: &mut TransformReport,
    ) -> Result<()>
    where
        R: RecordAccess + ?Sized,
    {
        match plan.resolve(record, &self.decomposer)? {
            Some(row) => {
                self.writer
                    .write_record(&row)
                    .map_err(|e| TransformError::csv(&self.path, e))?;
                report.rows_written += 1;
            }
            None => {
                report.rows_dropped += 1;
                tracing::trace!(record = report.records(), "Dropped empty record");
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<File> {
        self.writer
            .into_inner()
            .map_err(|e| TransformError::write(&self.path, e.into_error()))
    }
}
