//! Address parser backed by an external command.
//!
//! The command receives one address on stdin and must print a JSON array of
//! `[token, label]` pairs on stdout, e.g. a small wrapper around libpostal.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use super::{AddressParseError, AddressParser, AddressToken};

/// Runs an external program once per address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAddressParser {
    program: String,
    args: Vec<String>,
}

impl CommandAddressParser {
    /// Builds a parser from a program and its arguments.
    ///
    /// Returns `None` for an empty command line.
    pub fn new<I, S>(command: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = command.into_iter().map(Into::into);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// The command line, for messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn process_error(&self, source: std::io::Error) -> AddressParseError {
        AddressParseError::Process {
            command: self.command_line(),
            source,
        }
    }
}

impl AddressParser for CommandAddressParser {
    fn parse(&self, address: &str) -> Result<Vec<AddressToken>, AddressParseError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.process_error(e))?;

        // Dropping stdin closes the pipe so the child sees end of input. A
        // child may exit without reading it all; its status and output decide.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(address.as_bytes()) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(self.process_error(e)),
                Ok(()) => {}
            }
        }
        let output = child
            .wait_with_output()
            .map_err(|e| self.process_error(e))?;

        if !output.status.success() {
            return Err(AddressParseError::Exit {
                command: self.command_line(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pairs: Vec<(String, String)> =
            serde_json::from_slice(&output.stdout).map_err(|e| AddressParseError::Output {
                command: self.command_line(),
                source: e,
            })?;
        Ok(pairs
            .into_iter()
            .map(|(text, label)| AddressToken { text, label })
            .collect())
    }
}
