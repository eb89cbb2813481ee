//! context
//!
//! Per-invocation state threaded from bootstrap into command handlers.
//!
//! # Design
//!
//! A [`CliContext`] is created once per process, populated step by step by
//! [`crate::cli::bootstrap::load_cli`], and then passed immutably to the
//! selected command handler. Fields are optional because the bootstrap may
//! legitimately stop short: no configuration file means no system config,
//! no project file means no project, and so on. Handlers that need a field
//! ask for it through `require_*` accessors and get a user-facing error
//! instead of a panic when it is absent.
//!
//! # Verbosity
//!
//! Verbosity is resolved from the populated options. Before options are
//! populated (or when an error fires that early) the resolver returns
//! `true`: a failure that happens before flags are known is exactly the
//! kind of failure whose full diagnostics should not be hidden.

use std::future::Future;
use std::path::PathBuf;

use crate::cli::blocking;
use crate::cli::commands::registry::CommandRegistry;
use crate::config::{ProjectConfig, SystemConfig};
use crate::engine::Engine;
use crate::error::CliError;

/// Global flags recognized before the subcommand on every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Explicit path to a project file, overriding directory discovery.
    pub project: Option<PathBuf>,
    /// Show full diagnostic traces on fatal errors.
    pub verbose: bool,
    /// Refresh blueprint repositories before loading configuration.
    pub update: bool,
    /// Move an already-registered project name to the current location.
    pub rename: bool,
}

/// State accumulated by the bootstrap sequence for one CLI invocation.
pub struct CliContext {
    options: Option<GlobalOptions>,
    /// Loaded system configuration, if a configuration file existed.
    pub system_config: Option<SystemConfig>,
    /// Connected execution backend, if configuration loading succeeded.
    pub engine: Option<Box<dyn Engine>>,
    /// Whether the resolved project has completed `setup`. `None` until a
    /// project is resolved.
    pub project_is_set_up: Option<bool>,
    /// True when the invocation only introspects the CLI (completion,
    /// shell-init); all warnings are suppressed in this mode.
    pub resilient_parsing: bool,
    /// Command groups registered for this invocation.
    pub registry: CommandRegistry,
}

impl CliContext {
    pub fn new() -> Self {
        CliContext {
            options: None,
            system_config: None,
            engine: None,
            project_is_set_up: None,
            resilient_parsing: false,
            registry: CommandRegistry::new(),
        }
    }

    /// Install the parsed global options. First bootstrap step; later steps
    /// and error reporting read verbosity from here.
    pub fn populate_options(&mut self, options: GlobalOptions) {
        self.options = Some(options);
    }

    pub fn options(&self) -> Option<&GlobalOptions> {
        self.options.as_ref()
    }

    /// Resolve verbosity. Unpopulated options mean verbose, so that errors
    /// raised before flag parsing are never swallowed.
    pub fn is_verbose(&self) -> bool {
        self.options.as_ref().map_or(true, |options| options.verbose)
    }

    /// The resolved project, if the loaded configuration carries one.
    pub fn project(&self) -> Option<&ProjectConfig> {
        self.system_config.as_ref().and_then(|system| system.project())
    }

    /// The resolved project, or a user-facing error explaining how to get one.
    pub fn require_project(&self) -> Result<&ProjectConfig, CliError> {
        self.project().ok_or_else(|| {
            CliError::new(
                "No project is loaded. Run this command from a directory containing \
                 a riptide.toml file, or pass -p/--project.",
                self,
            )
        })
    }

    /// The connected engine, or a user-facing error.
    pub fn require_engine(&self) -> Result<&dyn Engine, CliError> {
        self.engine.as_deref().ok_or_else(|| {
            CliError::new(
                "No engine is available. Check the engine setting in your riptide \
                 configuration.",
                self,
            )
        })
    }

    /// Run an async command body to completion on a fresh scheduler.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, CliError> {
        blocking::run(future)
            .map_err(|err| CliError::with_cause("Failed to start the command scheduler.", self, err))
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
