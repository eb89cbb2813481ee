//! cli
//!
//! Command-line interface layer for riptide.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Run the bootstrap sequence against a fresh context
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Arguments are parsed via clap, the bootstrap in
//! [`bootstrap`] loads configuration and backends onto a
//! [`crate::context::CliContext`], and [`commands::dispatch`] hands the
//! context to the selected handler. Fatal errors are rendered exactly once,
//! in `main`, never inside this layer.

pub mod args;
pub mod blocking;
pub mod bootstrap;
pub mod commands;

pub use args::{Cli, Shell};

use crate::context::CliContext;
use crate::error::CliError;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse_args();

    let mut ctx = CliContext::new();
    ctx.resilient_parsing = cli.command.is_introspection();

    bootstrap::load_cli(&mut ctx, &cli)?;
    commands::dispatch(&ctx, cli.command)
}
