//! Record transformation into the standard business-registry schema.
//!
//! This crate turns a validated source into its standardized clean file:
//!
//! - **Label Mapping**: Resolve each standard field to a CSV column, an XML
//!   path, or a forced literal
//! - **Address Decomposition**: Split a free-form address into the seven
//!   structured address columns through an injected [`AddressParser`]
//! - **Transformation**: Walk every record, resolve and scrub each field, and
//!   write non-empty rows in the standard column order
//! - **Finalization**: Move the result to the clean path and optionally fill
//!   in the standard columns the dataset does not carry
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use obr_transform::{HeuristicAddressParser, ProcessOptions, process};
//!
//! let report = process(
//!     Path::new("sources/bc.json"),
//!     &ProcessOptions::default(),
//!     &HeuristicAddressParser::new(),
//! )?;
//! println!("{} rows written to {}", report.transform.rows_written, report.clean_path.display());
//! ```

mod address;
mod error;
mod finalize;
mod labels;
mod pipeline;
mod plan;
mod scrub;
mod transform;

// === Error Types ===
pub use error::{Result, TransformError};

// === Text Scrubbing ===
pub use scrub::{scrub, scrub_bytes};

// === Address Decomposition ===
pub use address::{
    AddressCells, AddressDecomposer, AddressParseError, AddressParser, AddressToken,
    CommandAddressParser, HeuristicAddressParser, parser_label, project,
};

// === Label Mapping ===
pub use labels::build_label_map;
pub use plan::{CellSource, OutputColumn, RecordAccess, RowPlan};

// === Transformation ===
pub use transform::xml_tree::{XmlElement, parse_document};
pub use transform::{TransformReport, Transformer};

// === Finalization ===
pub use finalize::{BlankFillReport, blank_fill, blank_fill_file, clean};

// === Pipeline ===
pub use pipeline::{ProcessOptions, ProcessReport, process, process_source};
