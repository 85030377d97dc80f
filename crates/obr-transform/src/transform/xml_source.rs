//! Record access for XML sources.
//!
//! Records are the elements named by the metadata `header`. A locator that
//! matches nothing, or an element without text, is an empty value. Locators
//! are compiled once, before the document is read.

use std::collections::HashMap;

use obr_ingest::{Source, SourceEncoding, read_decoded};
use obr_model::{ElementPath, LabelMap};

use super::xml_tree::{XmlElement, parse_document};
use super::{RecordSink, TransformReport};
use crate::error::{Result, TransformError};
use crate::plan::{RecordAccess, RowPlan};

/// Locator text to its compiled path.
type CompiledPaths = HashMap<String, ElementPath>;

struct XmlRecord<'a> {
    element: &'a XmlElement,
    paths: &'a CompiledPaths,
}

impl RecordAccess for XmlRecord<'_> {
    fn value(&self, path: &str) -> Option<&str> {
        self.paths
            .get(path)
            .and_then(|compiled| self.element.find_text(compiled))
    }
}

pub(super) fn transform(
    source: &Source,
    label_map: &LabelMap,
    encoding: SourceEncoding,
    plan: &RowPlan,
    sink: &mut RecordSink<'_>,
) -> Result<TransformReport> {
    let paths = compile_paths(label_map)?;

    let raw = &source.paths().raw;
    let text = read_decoded(raw, encoding)?;
    let root = parse_document(&text).map_err(|e| TransformError::xml(raw, e))?;

    let record_element = source.metadata().record_element().unwrap_or_default();
    let mut report = TransformReport::default();

    if let Some(root) = &root {
        for element in root.elements_named(record_element) {
            let record = XmlRecord {
                element,
                paths: &paths,
            };
            sink.accept(plan, &record, &mut report)?;
        }
    }

    if report.records() == 0 {
        tracing::warn!(
            path = %raw.display(),
            element = record_element,
            "No records found in XML document"
        );
    }
    Ok(report)
}

fn compile_paths(label_map: &LabelMap) -> Result<CompiledPaths> {
    let mut paths = CompiledPaths::new();
    for (field, locator) in label_map.record_locators() {
        if paths.contains_key(locator) {
            continue;
        }
        let compiled = ElementPath::parse(locator)
            .map_err(|source| TransformError::invalid_locator(field, source))?;
        paths.insert(locator.to_string(), compiled);
    }
    Ok(paths)
}
