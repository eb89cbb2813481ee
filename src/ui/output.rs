//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output falls into two streams: informational text and warnings go to
//! stdout, fatal errors go to stderr. Warnings carry a fixed `Warning:`
//! marker so scripts can filter them. Fatal errors are not printed here;
//! they are rendered once by [`crate::error::CliError`] at the top of the
//! process.

use std::fmt::Display;

/// Indentation used for hint blocks in multi-line messages.
pub const TAB: &str = "    ";

/// Print a warning to stdout, marked and followed by a blank line.
pub fn warn(message: impl Display) {
    println!("Warning: {}", message);
    println!();
}

/// Print a plain message to stdout.
pub fn plain(message: impl Display) {
    println!("{}", message);
}

/// Print an empty line to stdout.
pub fn blank() {
    println!();
}

/// Print a diagnostic message to stderr (only in verbose mode).
pub fn debug(message: impl Display, verbose: bool) {
    if verbose {
        eprintln!("[debug] {}", message);
    }
}
