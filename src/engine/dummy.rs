//! engine::dummy
//!
//! In-memory engine for tests and dry runs.
//!
//! # Design
//!
//! Tracks service state in a shared [`DummyState`] instead of touching any
//! real backend. Tests hand the same state handle to several engine
//! instances to observe what commands did. Every operation validates the
//! service selection exactly like a real backend would.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{select_services, Engine, EngineError, ServiceStatus};
use crate::config::ProjectConfig;

pub const ENGINE_NAME: &str = "dummy";

/// Recorded world state of the dummy backend.
#[derive(Debug, Default)]
pub struct DummyState {
    /// `(project, service)` pairs currently running.
    pub running: BTreeSet<(String, String)>,
    /// Every `exec` call: project, service, argv.
    pub exec_log: Vec<(String, String, Vec<String>)>,
    /// Every `import_db` call: project, service, dump path.
    pub imports: Vec<(String, String, PathBuf)>,
}

/// Engine that operates on a [`DummyState`] only.
pub struct DummyEngine {
    state: Arc<Mutex<DummyState>>,
}

impl DummyEngine {
    pub fn new() -> Self {
        Self::with_state(Arc::default())
    }

    /// Build an engine over an externally owned state handle.
    pub fn with_state(state: Arc<Mutex<DummyState>>) -> Self {
        DummyEngine { state }
    }

    pub fn state(&self) -> Arc<Mutex<DummyState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, DummyState> {
        // A poisoned lock only means a test panicked while holding it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_service(project: &ProjectConfig, service: &str) -> Result<(), EngineError> {
        if project.app.services.contains_key(service) {
            Ok(())
        } else {
            Err(EngineError::UnknownService(service.to_string()))
        }
    }
}

impl Default for DummyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for DummyEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn start(&self, project: &ProjectConfig, services: &[String]) -> Result<(), EngineError> {
        let selected = select_services(project, services)?;
        let mut state = self.lock();
        for service in selected {
            state
                .running
                .insert((project.name.as_str().to_string(), service));
        }
        Ok(())
    }

    async fn stop(&self, project: &ProjectConfig, services: &[String]) -> Result<(), EngineError> {
        let selected = select_services(project, services)?;
        let mut state = self.lock();
        for service in selected {
            state
                .running
                .remove(&(project.name.as_str().to_string(), service));
        }
        Ok(())
    }

    async fn status(
        &self,
        project: &ProjectConfig,
    ) -> Result<BTreeMap<String, ServiceStatus>, EngineError> {
        let state = self.lock();
        let mut statuses = BTreeMap::new();
        for service in project.app.services.keys() {
            let key = (project.name.as_str().to_string(), service.clone());
            let status = if state.running.contains(&key) {
                ServiceStatus::Running
            } else {
                ServiceStatus::Stopped
            };
            statuses.insert(service.clone(), status);
        }
        Ok(statuses)
    }

    async fn exec(
        &self,
        project: &ProjectConfig,
        service: &str,
        argv: &[String],
    ) -> Result<i32, EngineError> {
        Self::ensure_service(project, service)?;
        self.lock().exec_log.push((
            project.name.as_str().to_string(),
            service.to_string(),
            argv.to_vec(),
        ));
        Ok(0)
    }

    async fn import_db(
        &self,
        project: &ProjectConfig,
        service: &str,
        dump: &Path,
    ) -> Result<(), EngineError> {
        Self::ensure_service(project, service)?;
        self.lock().imports.push((
            project.name.as_str().to_string(),
            service.to_string(),
            dump.to_path_buf(),
        ));
        Ok(())
    }
}
