//! Typed source metadata document.
//!
//! A metadata document is authored per dataset and describes where each
//! standard field lives in the raw file. It is validated as untyped JSON
//! first and only then deserialized into [`SourceMetadata`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raw file format of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Xml,
}

impl DataFormat {
    /// Tag used in metadata documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(DataFormat::Csv),
            "xml" => Ok(DataFormat::Xml),
            other => Err(format!("unsupported data format '{other}'")),
        }
    }
}

/// Where a field's value comes from in a raw record.
///
/// For CSV sources a locator is a column name; for XML sources it is a
/// relative element path. A list of locators is fetched in order and joined
/// with single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Single(String),
    Many(Vec<String>),
}

impl Locator {
    /// Iterates over the individual locator paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Locator::Single(path) => std::slice::from_ref(path),
            Locator::Many(paths) => paths,
        };
        slice.iter().map(String::as_str)
    }

    /// Returns true for a list locator.
    pub fn is_list(&self) -> bool {
        matches!(self, Locator::Many(_))
    }

    /// Applies `f` to every path, keeping the single/list shape.
    pub fn map_paths(&self, mut f: impl FnMut(&str) -> String) -> Locator {
        match self {
            Locator::Single(path) => Locator::Single(f(path)),
            Locator::Many(paths) => Locator::Many(paths.iter().map(|p| f(p)).collect()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Single(path) => f.write_str(path),
            Locator::Many(paths) => write!(f, "[{}]", paths.join(", ")),
        }
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Locator::Single(value.to_string())
    }
}

/// The `info` object of a metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Structured address sub-fields, mutually exclusive with `full_addr`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<BTreeMap<String, Locator>>,
    /// Standard field name to locator.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Locator>,
}

impl FieldInfo {
    /// Locator declared directly in `info` for a field.
    pub fn field(&self, name: &str) -> Option<&Locator> {
        self.fields.get(name)
    }

    /// Locator declared in the `address` group for a field.
    pub fn address_field(&self, name: &str) -> Option<&Locator> {
        self.address.as_ref().and_then(|group| group.get(name))
    }
}

/// A validated, strongly-typed metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub format: DataFormat,
    /// Raw file name, relative to the raw data directory.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Repeating record element (XML only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Declared character encoding of the raw file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub info: FieldInfo,
    /// Literal values for `city`, `prov` or `country`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub force: BTreeMap<String, String>,
}

impl SourceMetadata {
    /// Forced literal for a field, if any.
    pub fn forced(&self, name: &str) -> Option<&str> {
        self.force.get(name).map(String::as_str)
    }

    /// Record element name for XML sources.
    pub fn record_element(&self) -> Option<&str> {
        self.header.as_deref()
    }
}
