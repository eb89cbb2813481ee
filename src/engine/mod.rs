//! engine
//!
//! Pluggable execution backends for project services.
//!
//! # Architecture
//!
//! An [`Engine`] owns the lifecycle of a project's services: starting,
//! stopping, querying status, executing commands inside a service, and
//! ingesting database dumps. Command handlers talk to `&dyn Engine`
//! exclusively; which backend is behind it is decided once at bootstrap by
//! [`load_engine`] from the configured engine name.
//!
//! # Backends
//!
//! - [`docker`] - Drives the local `docker` CLI (the default)
//! - [`dummy`] - In-memory backend for tests and dry runs
//!
//! # Invariants
//!
//! - Loading probes connectivity: a successfully loaded engine was
//!   reachable at bootstrap time
//! - Engines only touch containers they created for the given project
//! - Service names are validated against the app document before any
//!   backend work happens

pub mod docker;
pub mod dummy;

pub use docker::DockerEngine;
pub use dummy::DummyEngine;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ProjectConfig;

/// Errors from engine selection and connection.
#[derive(Debug, Error)]
pub enum EngineLoadError {
    /// The configured engine name matches no backend.
    #[error("engine '{0}' is not supported by this installation")]
    Unsupported(String),

    /// The backend exists but could not be reached.
    #[error("could not connect to the '{engine}' backend: {message}")]
    Connection { engine: String, message: String },
}

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("service '{0}' is not defined for this project")]
    UnknownService(String),

    #[error("{operation} failed: {message}")]
    CommandFailed { operation: String, message: String },

    #[error("service '{service}' does not support {operation}")]
    Unsupported { service: String, operation: String },

    #[error("engine i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Observed state of one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Running => f.write_str("running"),
            ServiceStatus::Stopped => f.write_str("stopped"),
        }
    }
}

/// An execution backend.
///
/// All operations take the project explicitly so a single engine instance
/// can serve any project, and an empty `services` slice means "all services
/// of the app".
#[async_trait]
pub trait Engine: Send + Sync {
    /// Backend name as used in configuration.
    fn name(&self) -> &str;

    /// Start the given services (all services when empty).
    async fn start(&self, project: &ProjectConfig, services: &[String]) -> Result<(), EngineError>;

    /// Stop the given services (all services when empty).
    async fn stop(&self, project: &ProjectConfig, services: &[String]) -> Result<(), EngineError>;

    /// Status of every service defined by the app document.
    async fn status(
        &self,
        project: &ProjectConfig,
    ) -> Result<BTreeMap<String, ServiceStatus>, EngineError>;

    /// Run `argv` inside a service with inherited stdio, returning the exit
    /// code.
    async fn exec(
        &self,
        project: &ProjectConfig,
        service: &str,
        argv: &[String],
    ) -> Result<i32, EngineError>;

    /// Ingest a database dump into a service using its configured import
    /// command.
    async fn import_db(
        &self,
        project: &ProjectConfig,
        service: &str,
        dump: &Path,
    ) -> Result<(), EngineError>;
}

/// Create and probe the engine named by configuration.
///
/// # Errors
///
/// - [`EngineLoadError::Unsupported`] for an unknown name
/// - [`EngineLoadError::Connection`] when the backend cannot be reached
pub fn load_engine(name: &str) -> Result<Box<dyn Engine>, EngineLoadError> {
    match name {
        docker::ENGINE_NAME => Ok(Box::new(DockerEngine::connect()?)),
        dummy::ENGINE_NAME => Ok(Box::new(DummyEngine::new())),
        other => Err(EngineLoadError::Unsupported(other.to_string())),
    }
}

/// Expand and validate a service selection against the app document.
///
/// An empty selection expands to every defined service; explicit names must
/// all exist.
pub(crate) fn select_services(
    project: &ProjectConfig,
    requested: &[String],
) -> Result<Vec<String>, EngineError> {
    if requested.is_empty() {
        return Ok(project.app.services.keys().cloned().collect());
    }
    for name in requested {
        if !project.app.services.contains_key(name) {
            return Err(EngineError::UnknownService(name.clone()));
        }
    }
    Ok(requested.to_vec())
}
