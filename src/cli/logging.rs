// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Console logging macros with a global verbosity switch.
//!
//! Every macro goes through [`emit`]: warnings and errors go to stderr,
//! everything else to stdout. `verbose!` and `section!` lines are dropped
//! when verbosity is off.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

/// Global verbosity flag.
static VERBOSE: AtomicBool = AtomicBool::new(true);

/// Set the global verbosity flag.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check if verbose output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Kind of console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Verbose,
    Section,
    Success,
    Warning,
    Error,
}

impl Level {
    /// Written to stderr rather than stdout.
    #[must_use]
    pub const fn is_diagnostic(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }

    /// Suppressed unless verbose output is on.
    #[must_use]
    pub const fn needs_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Section)
    }
}

/// Render `msg` with the prefix and colors of `level`.
#[must_use]
pub fn format_line(level: Level, msg: &str) -> String {
    match level {
        Level::Info | Level::Verbose => msg.to_string(),
        Level::Section => msg.cyan().bold().to_string(),
        Level::Success => format!("{} {msg}", "✅".green()),
        Level::Warning => format!("{} {msg}", "WARNING ⚠️".yellow().bold()),
        Level::Error => format!("{} {msg}", "Error:".red().bold()),
    }
}

/// Print one line at `level`.
pub fn emit(level: Level, args: fmt::Arguments<'_>) {
    if level.needs_verbose() && !is_verbose() {
        return;
    }
    let line = format_line(level, &args.to_string());
    if level.is_diagnostic() {
        eprintln!("{line}");
    } else {
        if level == Level::Section {
            println!();
        }
        println!("{line}");
    }
}

/// Macro for standard info messages.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit($crate::cli::logging::Level::Info, format_args!($($arg)*))
    }
}

/// Macro for warning messages.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit($crate::cli::logging::Level::Warning, format_args!($($arg)*))
    }
}

/// Macro for error messages.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit($crate::cli::logging::Level::Error, format_args!($($arg)*))
    }
}

/// Macro for success messages.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit($crate::cli::logging::Level::Success, format_args!($($arg)*))
    }
}

/// Macro for verbose messages.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit($crate::cli::logging::Level::Verbose, format_args!($($arg)*))
    }
}

/// Macro for section headers.
#[macro_export]
macro_rules! section {
    ($($arg:tt)*) => {
        $crate::cli::logging::emit($crate::cli::logging::Level::Section, format_args!($($arg)*))
    }
}
