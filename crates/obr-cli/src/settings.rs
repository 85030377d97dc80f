//! Run settings loaded from an optional TOML file.
//!
//! ```toml
//! data_root = "pddir"
//!
//! [address_parser]
//! kind = "command"
//! command = ["python3", "parse_address.py"]
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Deserialize;

use obr_ingest::DEFAULT_DATA_ROOT;
use obr_transform::{AddressParser, CommandAddressParser, HeuristicAddressParser};

/// Settings file read from the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "obr.toml";

/// Environment variable overriding the default data root.
pub const DATA_ROOT_ENV: &str = "OBR_DATA_ROOT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding `raw/`, `dirty/` and `clean/`.
    pub data_root: Option<PathBuf>,
    pub address_parser: ParserSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSettings {
    pub kind: ParserKind,
    /// Program and arguments, used when `kind = "command"`.
    pub command: Vec<String>,
}

/// Which address parser decomposes `full_addr` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Built-in pattern-based parser for North American addresses.
    #[default]
    Heuristic,
    /// External program reading an address on stdin, printing JSON tokens.
    Command,
}

impl Settings {
    /// Loads settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] when it
    /// exists. Without either, the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse settings file {}", path.display()))
    }

    /// Resolves the data root.
    ///
    /// Precedence: command-line flag, then the environment value, then the
    /// settings file, then [`DEFAULT_DATA_ROOT`].
    pub fn data_root(&self, flag: Option<&Path>, env: Option<OsString>) -> PathBuf {
        if let Some(flag) = flag {
            return flag.to_path_buf();
        }
        if let Some(env) = env.filter(|value| !value.is_empty()) {
            return PathBuf::from(env);
        }
        self.data_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT))
    }

    /// Builds the address parser, letting command-line values override the
    /// file. `command` is a whitespace-separated command line.
    pub fn address_parser(
        &self,
        kind: Option<ParserKind>,
        command: Option<&str>,
    ) -> Result<Box<dyn AddressParser>> {
        match kind.unwrap_or(self.address_parser.kind) {
            ParserKind::Heuristic => Ok(Box::new(HeuristicAddressParser::new())),
            ParserKind::Command => {
                let parser = match command {
                    Some(line) => CommandAddressParser::new(line.split_whitespace()),
                    None => CommandAddressParser::new(self.address_parser.command.iter().cloned()),
                };
                let Some(parser) = parser else {
                    bail!("the command address parser needs a command line (--parser-command)");
                };
                tracing::debug!(command = %parser.command_line(), "Using external address parser");
                Ok(Box::new(parser))
            }
        }
    }
}
