// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface: argument parsing, console logging and the
//! `parse` and `joints` commands.

// Modules
/// CLI arguments.
pub mod args;

/// Joint table command.
pub mod joints;

/// Console logging macros.
pub mod logging;

/// Video parsing command.
pub mod parse;
