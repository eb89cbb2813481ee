//! error
//!
//! The user-facing fatal error type and its reporter.
//!
//! # Design
//!
//! Fallible collaborator modules define their own `thiserror` enums. At the
//! CLI boundary those are wrapped exactly once into a [`CliError`]: a
//! user-facing message plus the underlying cause. A `CliError` snapshots
//! the invocation state it needs for rendering (resolved options and the
//! resilient-parsing flag) at construction time, so reporting never has to
//! reach back into live CLI state.
//!
//! # Rendering
//!
//! - resilient parsing: nothing is printed at all
//! - verbose: the message and the full cause chain
//! - otherwise: the message, a one-line cause summary, and a hint that
//!   `-v` exists
//!
//! All rendering goes to stderr; warnings and regular output never pass
//! through here.

use std::fmt;
use std::io::{self, Write};

use crate::context::{CliContext, GlobalOptions};
use crate::ui::output::TAB;

/// A fatal, user-facing CLI error. Constructing one does not print
/// anything; the process entry point renders it exactly once.
#[derive(Debug)]
pub struct CliError {
    message: String,
    options: Option<GlobalOptions>,
    resilient: bool,
    cause: Option<anyhow::Error>,
}

impl CliError {
    /// Wrap a user-facing message with a snapshot of the invocation state.
    pub fn new(message: impl Into<String>, ctx: &CliContext) -> Self {
        CliError {
            message: message.into(),
            options: ctx.options().cloned(),
            resilient: ctx.resilient_parsing,
            cause: None,
        }
    }

    /// Like [`CliError::new`], but keeps the underlying error as the cause.
    pub fn with_cause(
        message: impl Into<String>,
        ctx: &CliContext,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        CliError {
            cause: Some(cause.into()),
            ..CliError::new(message, ctx)
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    fn is_verbose(&self) -> bool {
        self.options.as_ref().map_or(true, |options| options.verbose)
    }

    /// Render to stderr using the verbosity captured at construction time.
    pub fn print(&self) {
        // Stderr failing here means the process is already beyond help.
        let _ = self.write_to(&mut io::stderr(), false);
    }

    /// Render to an arbitrary writer. `force_verbose` overrides the captured
    /// verbosity, for callers capturing errors into a log.
    pub fn write_to(&self, out: &mut dyn Write, force_verbose: bool) -> io::Result<()> {
        if self.resilient {
            return Ok(());
        }

        writeln!(out, "Error: {}", self.message)?;

        let Some(cause) = &self.cause else {
            return Ok(());
        };

        if force_verbose || self.is_verbose() {
            writeln!(out)?;
            writeln!(out, "Caused by:")?;
            for (index, err) in cause.chain().enumerate() {
                writeln!(out, "{}{}: {}", TAB, index, err)?;
            }
        } else {
            writeln!(out, ">> {}", cause)?;
            writeln!(out)?;
            writeln!(out, "Use -v (before the subcommand) to show the full error trace.")?;
        }
        Ok(())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| -> &(dyn std::error::Error + 'static) { cause.as_ref() })
    }
}
