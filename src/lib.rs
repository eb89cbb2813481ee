//! Riptide - define and run development environments from declarative files
//!
//! Riptide is a single-binary tool that turns a declarative project file and
//! its app document into running services: starting and stopping them through
//! a pluggable engine, wiring app commands into the user's shell, and keeping
//! database environments and imports per project.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (args, bootstrap, dispatch)
//! - [`context`] - Per-invocation state threaded from bootstrap to handlers
//! - [`config`] - Configuration model, loader, and project registry
//! - [`engine`] - Pluggable execution backends (docker, dummy)
//! - [`shell`] - Shell integration hook and per-project alias scripts
//! - [`error`] - The user-facing fatal error type and its reporter
//! - [`ui`] - Terminal output utilities
//!
//! # Correctness Invariants
//!
//! Riptide maintains the following invariants:
//!
//! 1. Global options are populated before any other bootstrap step runs
//! 2. The system configuration is either absent or completely loaded
//! 3. At most one fatal error escapes per invocation, rendered once at the
//!    top of the process
//! 4. Warnings never alter control flow or the exit status

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod shell;
pub mod ui;
