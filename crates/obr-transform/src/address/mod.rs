//! Structured address decomposition.
//!
//! An [`AddressParser`] turns a free-form address into labelled tokens. The
//! [`AddressDecomposer`] projects those tokens onto the seven structured
//! address columns in mailing order.

mod command;
mod heuristic;

use std::process::ExitStatus;

use obr_model::ADDRESS_FIELDS;
use thiserror::Error;

pub use command::CommandAddressParser;
pub use heuristic::HeuristicAddressParser;

/// One structured-address cell per entry of [`ADDRESS_FIELDS`].
pub type AddressCells = [String; ADDRESS_FIELDS.len()];

/// A labelled piece of a parsed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressToken {
    pub text: String,
    /// Parser label, e.g. `house_number`, `road` or `state`.
    pub label: String,
}

impl AddressToken {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Errors raised by an address parser.
#[derive(Debug, Error)]
pub enum AddressParseError {
    /// The parser process could not be started or talked to.
    #[error("failed to run address parser '{command}': {source}")]
    Process {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The parser process exited unsuccessfully.
    #[error("address parser '{command}' exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The parser printed something other than a token list.
    #[error("address parser '{command}' returned invalid output: {source}")]
    Output {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Splits a free-form address into labelled tokens.
///
/// Any `Fn(&str) -> Vec<AddressToken>` is a parser, so tests can inject a
/// closure.
pub trait AddressParser {
    fn parse(&self, address: &str) -> Result<Vec<AddressToken>, AddressParseError>;
}

impl<F> AddressParser for F
where
    F: Fn(&str) -> Vec<AddressToken>,
{
    fn parse(&self, address: &str) -> Result<Vec<AddressToken>, AddressParseError> {
        Ok(self(address))
    }
}

/// Parser label that carries a structured address field.
///
/// Parsers call the province `state`; every other field uses its own name.
pub fn parser_label(field: &str) -> &str {
    match field {
        "prov" => "state",
        other => other,
    }
}

/// Projects a token list onto the structured address columns.
///
/// Each column takes the text of the first token carrying its label, or an
/// empty string when no token does.
pub fn project(tokens: &[AddressToken]) -> AddressCells {
    ADDRESS_FIELDS.map(|field| {
        let label = parser_label(field);
        tokens
            .iter()
            .find(|token| token.label == label)
            .map(|token| token.text.clone())
            .unwrap_or_default()
    })
}

/// Decomposes scrubbed address strings with an injected parser.
#[derive(Clone, Copy)]
pub struct AddressDecomposer<'a> {
    parser: &'a dyn AddressParser,
}

impl<'a> AddressDecomposer<'a> {
    pub fn new(parser: &'a dyn AddressParser) -> Self {
        Self { parser }
    }

    /// Parses `address` and projects it onto the address columns.
    ///
    /// The input must already be scrubbed. An empty address is not sent to
    /// the parser.
    pub fn decompose(&self, address: &str) -> Result<AddressCells, AddressParseError> {
        if address.is_empty() {
            return Ok(AddressCells::default());
        }
        let tokens = self.parser.parse(address)?;
        tracing::trace!(address, tokens = tokens.len(), "Parsed address");
        Ok(project(&tokens))
    }
}
