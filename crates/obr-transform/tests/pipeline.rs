//! Integration tests for the end-to-end processing pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use obr_ingest::{IngestError, PathLayout, SourceEncoding, temp_path_for};
use obr_model::STANDARD_FIELDS;
use obr_transform::{
    AddressToken, HeuristicAddressParser, ProcessOptions, TransformError, process,
};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the raw file and the metadata document; returns the document path.
    fn source(&self, document: Value, raw: &[u8]) -> PathBuf {
        let file = document["file"].as_str().unwrap();
        let raw_path = self.root().join("raw").join(file);
        fs::create_dir_all(raw_path.parent().unwrap()).unwrap();
        fs::write(&raw_path, raw).unwrap();

        let document_path = self.root().join("sources").join(format!("{file}.json"));
        fs::create_dir_all(document_path.parent().unwrap()).unwrap();
        fs::write(&document_path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
        document_path
    }

    fn options(&self) -> ProcessOptions {
        ProcessOptions {
            layout: PathLayout::new(self.root()),
            ..ProcessOptions::default()
        }
    }

    fn clean(&self, base: &str) -> PathBuf {
        self.root().join("clean").join(format!("{base}-clean.csv"))
    }

    fn dirty(&self, base: &str) -> PathBuf {
        self.root().join("dirty").join(format!("{base}-dirty.csv"))
    }
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn cell<'a>(header: &[String], row: &'a [String], name: &str) -> &'a str {
    let index = header.iter().position(|h| h == name).unwrap();
    &row[index]
}

#[test]
fn csv_full_address_is_decomposed() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "csv",
            "file": "acme.csv",
            "info": {"bus_name": "Name", "full_addr": "Addr"}
        }),
        b"Name,Addr\nAcme,\"123 Main St, Springfield\"\n",
    );

    let report = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();
    assert_eq!(report.transform.rows_written, 1);
    assert_eq!(report.clean_path, ws.clean("acme"));
    assert!(!ws.dirty("acme").exists());

    let text = fs::read_to_string(ws.clean("acme")).unwrap();
    let header_line = text.lines().next().unwrap().to_string();
    insta::assert_snapshot!(
        header_line,
        @r#""bus_name","unit","house_number","road","city","prov","country","postcode""#
    );

    let (_, rows) = read_rows(&ws.clean("acme"));
    assert_eq!(
        rows,
        vec![["acme", "", "123", "main st", "springfield", "", "", ""].map(String::from).to_vec()]
    );
}

#[test]
fn csv_empty_records_are_dropped() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "csv",
            "file": "sparse.csv",
            "info": {"bus_name": "Name", "phone": "Tel"}
        }),
        b"Name,Tel\nAcme,555-0100\n,\n  ,\t\nBeta,\n",
    );

    let report = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();
    assert_eq!(report.transform.rows_written, 2);
    assert_eq!(report.transform.rows_dropped, 2);

    let (header, rows) = read_rows(&ws.clean("sparse"));
    assert_eq!(rows.len(), 2);
    assert_eq!(cell(&header, &rows[1], "bus_name"), "beta");
    assert_eq!(cell(&header, &rows[1], "phone"), "");
}

#[test]
fn csv_forced_country_overrides_source() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "csv",
            "file": "forced.csv",
            "info": {"bus_name": "Name", "full_addr": "Addr"},
            "force": {"country": "Canada"}
        }),
        b"Name,Addr,Country\nAcme,\"1 Ocean Ave, Miami, USA\",USA\nBeta,,\n",
    );

    process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();

    let (header, rows) = read_rows(&ws.clean("forced"));
    assert_eq!(header.iter().filter(|h| *h == "country").count(), 1);
    for row in &rows {
        assert_eq!(cell(&header, row, "country"), "canada");
    }
    assert_eq!(cell(&header, &rows[0], "city"), "miami");
}

#[test]
fn csv_missing_column_aborts() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "csv",
            "file": "broken.csv",
            "info": {"bus_name": "Name", "email": "Email"}
        }),
        b"Name\nAcme\n",
    );

    let err = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap_err();
    assert!(matches!(
        err,
        TransformError::FieldNotFound { ref field, ref locator, .. }
            if field == "email" && locator == "Email"
    ));
    assert!(!ws.clean("broken").exists());
    assert!(!temp_path_for(&ws.dirty("broken")).exists());
}

#[test]
fn csv_ragged_rows_and_legacy_encoding() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "csv",
            "file": "legacy.csv",
            "info": {"bus_name": "Name", "bus_desc": "Desc", "phone": "Tel"}
        }),
        b"\xEF\xBB\xBFName,Desc,Tel\nCaf\xC3\xA9 Bar\nDeli,Sandwiches,555-0101,extra\n",
    );

    let report = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();
    assert_eq!(report.encoding, SourceEncoding::Utf8);
    let repair = report.repair.unwrap();
    assert!(repair.bom_stripped);
    assert_eq!(repair.padded_rows, 1);
    assert_eq!(repair.long_rows, 1);

    let (header, rows) = read_rows(&ws.clean("legacy"));
    assert_eq!(cell(&header, &rows[0], "bus_name"), "café bar");
    assert_eq!(cell(&header, &rows[1], "phone"), "555-0101");
}

#[test]
fn csv_cp1252_is_detected() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({"format": "csv", "file": "latin.csv", "info": {"bus_name": "Name"}}),
        b"Name\nCAF\xC9 DU MONDE\n",
    );

    let report = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();
    assert_eq!(report.encoding, SourceEncoding::Cp1252);

    let (header, rows) = read_rows(&ws.clean("latin"));
    assert_eq!(cell(&header, &rows[0], "bus_name"), "café du monde");
}

const XML_REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<businesses>
  <business>
    <name>Acme &amp; Sons</name>
    <location><street>123 Main St</street><town>Springfield</town></location>
  </business>
  <business>
    <name>Beta Corp</name>
  </business>
  <business>
    <name>   </name>
  </business>
</businesses>
"#;

#[test]
fn xml_missing_elements_are_empty() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "xml",
            "file": "registry.xml",
            "header": "business",
            "info": {
                "bus_name": "name",
                "email": "contact/email",
                "address": {"road": "location/street", "city": "town"}
            }
        }),
        XML_REGISTRY.as_bytes(),
    );

    let report = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();
    assert!(report.repair.is_none());
    assert_eq!(report.transform.rows_written, 2);
    assert_eq!(report.transform.rows_dropped, 1);

    let (header, rows) = read_rows(&ws.clean("registry"));
    assert_eq!(cell(&header, &rows[0], "bus_name"), "acme & sons");
    assert_eq!(cell(&header, &rows[0], "road"), "123 main st");
    assert_eq!(cell(&header, &rows[0], "city"), "springfield");
    assert_eq!(cell(&header, &rows[0], "house_number"), "");
    assert_eq!(cell(&header, &rows[1], "bus_name"), "beta corp");
    assert_eq!(cell(&header, &rows[1], "email"), "");
    assert_eq!(cell(&header, &rows[1], "road"), "");
}

#[test]
fn xml_locators_with_predicates_and_parent_steps() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "xml",
            "file": "bilingual.xml",
            "header": "business",
            "info": {
                "bus_name": "name[@lang='en']",
                "phone": "contact/phone[last()]",
                "address": {"city": "location/street/../town"}
            }
        }),
        br#"<registry>
  <business>
    <name lang="fr">Acm&#233;</name>
    <name lang="en">Acme</name>
    <contact><phone>555-0100</phone><phone>555-0199</phone></contact>
    <location><street>1 Rue Principale</street><town>Gatineau</town></location>
  </business>
</registry>"#,
    );

    process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap();

    let (header, rows) = read_rows(&ws.clean("bilingual"));
    assert_eq!(cell(&header, &rows[0], "bus_name"), "acme");
    assert_eq!(cell(&header, &rows[0], "phone"), "555-0199");
    assert_eq!(cell(&header, &rows[0], "city"), "gatineau");
}

#[test]
fn xml_invalid_locator_is_rejected() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "xml",
            "file": "typo.xml",
            "header": "business",
            "info": {"bus_name": "name[@lang=en]"}
        }),
        XML_REGISTRY.as_bytes(),
    );

    let err = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap_err();
    match err {
        TransformError::Ingest(ingest) => {
            let schema = ingest.schema_error().unwrap();
            assert_eq!(schema.tag(), Some("info.bus_name"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ws.root().join("dirty").exists());
}

#[test]
fn xml_full_address_uses_injected_parser() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({
            "format": "xml",
            "file": "injected.xml",
            "header": "business",
            "info": {"bus_name": "name", "full_addr": ["location/street", "location/town"]}
        }),
        XML_REGISTRY.as_bytes(),
    );

    let parser = |address: &str| vec![AddressToken::new(address, "road")];
    process(&document, &ws.options(), &parser).unwrap();

    let (header, rows) = read_rows(&ws.clean("injected"));
    assert_eq!(cell(&header, &rows[0], "road"), "123 main st springfield");
    assert_eq!(cell(&header, &rows[1], "road"), "");
}

#[test]
fn blank_fill_completes_the_vocabulary() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({"format": "csv", "file": "filled.csv", "info": {"bus_name": "Name"}}),
        b"Name\nAcme\n",
    );
    let options = ProcessOptions {
        blank_fill: true,
        ..ws.options()
    };

    let report = process(&document, &options, &HeuristicAddressParser::new()).unwrap();
    assert!(report.blank_fill.is_some());

    let (header, rows) = read_rows(&ws.clean("filled"));
    assert_eq!(header.len(), STANDARD_FIELDS.len() - 1);
    assert_eq!(header[0], "bus_name");
    assert_eq!(cell(&header, &rows[0], "bus_name"), "acme");
}

#[test]
fn missing_raw_file_is_reported() {
    let ws = Workspace::new();
    let document = ws.root().join("absent.json");
    fs::write(
        &document,
        json!({"format": "csv", "file": "absent.csv", "info": {}}).to_string(),
    )
    .unwrap();

    let err = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Ingest(IngestError::RawDataMissing { .. })
    ));
}

#[test]
fn invalid_metadata_aborts_before_io() {
    let ws = Workspace::new();
    let document = ws.source(
        json!({"format": "json", "file": "odd.csv", "info": {}}),
        b"Name\nAcme\n",
    );

    let err = process(&document, &ws.options(), &HeuristicAddressParser::new()).unwrap_err();
    match err {
        TransformError::Ingest(ingest) => assert!(ingest.schema_error().is_some()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ws.root().join("dirty").exists());
}
