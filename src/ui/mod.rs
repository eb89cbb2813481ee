//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output except fatal error rendering goes through this
//! module so that streams and markers stay consistent: warnings and
//! progress on stdout, diagnostics and errors on stderr.

pub mod output;
