//! Data model for the Open Business Repository.
//!
//! This crate holds the types every other crate agrees on:
//!
//! - **Standard vocabulary**: the fixed, ordered list of output columns
//! - **Source metadata**: the typed form of a dataset's metadata document
//! - **Label maps**: standard field name to source locator
//! - **Lifecycle**: the states a dataset passes through while processed
//! - **Element paths**: compiled XML locators

mod element_path;
mod error;
mod fields;
mod label_map;
mod metadata;
mod state;

// === Errors ===
pub use error::{LifecycleError, SchemaError};

// === Standard Vocabulary ===
pub use fields::{
    ADDRESS_FIELDS, ADDRESS_GROUP, FORCE_FIELDS, FULL_ADDR, STANDARD_FIELDS, address_index,
    blank_fill_columns, is_address_field, is_force_field, is_standard_field, standard_field,
};

// === Metadata ===
pub use metadata::{DataFormat, FieldInfo, Locator, SourceMetadata};

// === Label Maps ===
pub use label_map::{FieldSource, LabelEntry, LabelMap};

// === Element Paths ===
pub use element_path::{
    ElementPath, ElementPathError, NameTest, PathStep, Position, Predicate, xml_search_path,
};

// === Lifecycle ===
pub use state::SourceState;
