//! Output row layout and per-record field resolution.
//!
//! A [`RowPlan`] is computed once per dataset from its label map. It fixes
//! the output columns and where each column's value comes from; both record
//! formats then resolve rows through the same plan.

use obr_model::{
    ADDRESS_FIELDS, FULL_ADDR, FieldSource, LabelMap, Locator, STANDARD_FIELDS, SourceMetadata,
    is_address_field,
};

use crate::address::{AddressCells, AddressDecomposer, AddressParseError};
use crate::scrub::scrub;

/// Read access to the values of one source record.
pub trait RecordAccess {
    /// Raw value at `path`, or `None` when the record has nothing there.
    fn value(&self, path: &str) -> Option<&str>;
}

/// Where an output cell takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellSource {
    /// Read from the record and scrubbed.
    Record(Locator),
    /// A forced literal, already scrubbed.
    Literal(String),
    /// One cell of the decomposed `full_addr`.
    Address(usize),
    /// Always empty.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: &'static str,
    pub source: CellSource,
}

/// Column layout and value sources of the standardized output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPlan {
    columns: Vec<OutputColumn>,
    full_address: Option<Locator>,
}

impl RowPlan {
    /// Lays out the output columns for a label map.
    ///
    /// Mapped fields keep vocabulary order. The structured address block is
    /// always emitted, in mailing order, where `full_addr` sits in the
    /// vocabulary. A forced address field overrides its block cell.
    pub fn new(label_map: &LabelMap, metadata: &SourceMetadata) -> Self {
        let full_address = label_map.full_address().cloned();

        let forced = |field: &str| {
            matches!(label_map.get(field), Some(FieldSource::Forced))
                .then(|| CellSource::Literal(scrub(metadata.forced(field).unwrap_or_default())))
        };

        let mut columns = Vec::new();
        for field in STANDARD_FIELDS {
            if field == FULL_ADDR {
                for (index, name) in ADDRESS_FIELDS.into_iter().enumerate() {
                    let source = forced(name).unwrap_or_else(|| {
                        if full_address.is_some() {
                            CellSource::Address(index)
                        } else {
                            match label_map.get(name) {
                                Some(FieldSource::Record(locator)) => {
                                    CellSource::Record(locator.clone())
                                }
                                _ => CellSource::Empty,
                            }
                        }
                    });
                    columns.push(OutputColumn { name, source });
                }
            } else if !is_address_field(field) {
                let source = match label_map.get(field) {
                    Some(FieldSource::Record(locator)) => CellSource::Record(locator.clone()),
                    Some(FieldSource::Forced) => forced(field).unwrap_or(CellSource::Empty),
                    None => continue,
                };
                columns.push(OutputColumn {
                    name: field,
                    source,
                });
            }
        }

        Self {
            columns,
            full_address,
        }
    }

    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    /// Output header, one name per column.
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    /// Resolves one record into an output row.
    ///
    /// Returns `None` when every cell is empty; such records are dropped.
    pub fn resolve<R>(
        &self,
        record: &R,
        decomposer: &AddressDecomposer<'_>,
    ) -> Result<Option<Vec<String>>, AddressParseError>
    where
        R: RecordAccess + ?Sized,
    {
        let address = match &self.full_address {
            Some(locator) => decomposer.decompose(&fetch(record, locator))?,
            None => AddressCells::default(),
        };

        let row: Vec<String> = self
            .columns
            .iter()
            .map(|column| match &column.source {
                CellSource::Record(locator) => fetch(record, locator),
                CellSource::Literal(value) => value.clone(),
                CellSource::Address(index) => address[*index].clone(),
                CellSource::Empty => String::new(),
            })
            .collect();

        if row.iter().all(String::is_empty) {
            Ok(None)
        } else {
            Ok(Some(row))
        }
    }
}

/// Reads every path of `locator`, joins the values with a space and scrubs.
fn fetch<R>(record: &R, locator: &Locator) -> String
where
    R: RecordAccess + ?Sized,
{
    let values: Vec<&str> = locator
        .paths()
        .map(|path| record.value(path).unwrap_or_default())
        .collect();
    scrub(&values.join(" "))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::address::AddressToken;
    use crate::labels::build_label_map;
    use serde_json::json;

    impl RecordAccess for HashMap<&str, &str> {
        fn value(&self, path: &str) -> Option<&str> {
            self.get(path).copied()
        }
    }

    fn plan(document: serde_json::Value) -> RowPlan {
        let metadata = obr_ingest::parse_metadata(&document).unwrap();
        RowPlan::new(&build_label_map(&metadata), &metadata)
    }

    fn street_parser(address: &str) -> Vec<AddressToken> {
        let (number, rest) = address.split_once(' ').unwrap_or(("", address));
        let (road, city) = rest.split_once(", ").unwrap_or((rest, ""));
        vec![
            AddressToken::new(number, "house_number"),
            AddressToken::new(road, "road"),
            AddressToken::new(city, "city"),
        ]
    }

    #[test]
    fn test_header_embeds_address_block() {
        let plan = plan(json!({
            "format": "csv",
            "file": "r.csv",
            "info": {"bus_name": "Name", "full_addr": "Addr", "phone": "Tel"}
        }));
        assert_eq!(
            plan.header(),
            vec![
                "bus_name",
                "unit",
                "house_number",
                "road",
                "city",
                "prov",
                "country",
                "postcode",
                "phone"
            ]
        );
    }

    #[test]
    fn test_address_block_present_without_address() {
        let plan = plan(json!({
            "format": "csv",
            "file": "r.csv",
            "info": {"bus_name": "Name"}
        }));
        assert_eq!(plan.header().len(), 1 + ADDRESS_FIELDS.len());
        assert!(
            plan.columns()[1..]
                .iter()
                .all(|column| column.source == CellSource::Empty)
        );
    }

    #[test]
    fn test_resolve_decomposes_full_address() {
        let plan = plan(json!({
            "format": "csv",
            "file": "r.csv",
            "info": {"bus_name": "Name", "full_addr": "Addr"}
        }));
        let record = HashMap::from([("Name", " Acme "), ("Addr", "123 Main St,  Springfield")]);

        let row = plan
            .resolve(&record, &AddressDecomposer::new(&street_parser))
            .unwrap()
            .unwrap();
        assert_eq!(
            row,
            ["acme", "", "123", "main st", "springfield", "", "", ""].map(String::from)
        );
    }

    #[test]
    fn test_resolve_concatenates_lists() {
        let plan = plan(json!({
            "format": "csv",
            "file": "r.csv",
            "info": {"bus_name": ["First", "Last"]}
        }));
        let record = HashMap::from([("First", "Acme"), ("Last", "WIDGETS")]);

        let row = plan
            .resolve(&record, &AddressDecomposer::new(&street_parser))
            .unwrap()
            .unwrap();
        assert_eq!(row[0], "acme widgets");
    }

    #[test]
    fn test_forced_value_overrides_decomposed_cell() {
        let plan = plan(json!({
            "format": "csv",
            "file": "r.csv",
            "info": {"full_addr": "Addr"},
            "force": {"city": "  VICTORIA "}
        }));
        let record = HashMap::from([("Addr", "1 Main St, Nanaimo")]);

        let row = plan
            .resolve(&record, &AddressDecomposer::new(&street_parser))
            .unwrap()
            .unwrap();
        assert_eq!(row[3], "victoria");
        assert_eq!(plan.header().iter().filter(|name| **name == "city").count(), 1);
    }

    #[test]
    fn test_empty_row_is_dropped() {
        let plan = plan(json!({
            "format": "xml",
            "file": "r.xml",
            "header": "biz",
            "info": {"bus_name": "name", "address": {"road": "street"}}
        }));
        let record: HashMap<&str, &str> = HashMap::from([(".//name", "  ")]);

        let row = plan
            .resolve(&record, &AddressDecomposer::new(&street_parser))
            .unwrap();
        assert_eq!(row, None);
    }
}
