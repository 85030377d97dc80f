//! Command-line front end for the Open Business Repository.
//!
//! The `obr` binary wires the library crates together: it reads run
//! settings, installs logging, processes each metadata document and prints
//! a summary table.

pub mod commands;
pub mod logging;
pub mod settings;
pub mod summary;
