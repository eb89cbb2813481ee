//! config::projects
//!
//! The persistent project registry.
//!
//! # Storage
//!
//! - `<config_dir>/projects.json` - Name to path mapping with timestamps
//! - `<config_dir>/projects.json.lock` - OS-level exclusive lock
//!
//! # Invariants
//!
//! - A registered name maps to exactly one path
//! - Re-registering the same name and path is a no-op
//! - Re-registering the same name at a new path fails unless `--rename`
//!   was given
//! - Writers hold the lock for the whole read-modify-write cycle, and the
//!   file is replaced atomically (temp file plus rename), so concurrent
//!   invocations serialize instead of corrupting the registry

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::files::{self, FilesError};
use super::ProjectConfig;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is taken by a project at a different path. The rendered
    /// text is shown to the user verbatim.
    #[error(
        "project '{name}' is already registered at '{}', but this project lives at '{}'. \
         Re-run with --rename if the project has moved.",
        existing.display(),
        requested.display()
    )]
    Collision {
        name: String,
        existing: PathBuf,
        requested: PathBuf,
    },

    #[error("registry i/o error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to encode the project registry: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Files(#[from] FilesError),
}

/// One registry entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectEntry {
    /// Canonical project folder.
    pub path: PathBuf,
    /// When the name was first registered.
    pub registered_at: DateTime<Utc>,
}

/// An exclusive lock over the registry file.
///
/// Released automatically on drop. Acquisition blocks until the current
/// holder finishes; registry writes are short, so waiting beats failing.
struct RegistryLock {
    _file: File,
}

impl RegistryLock {
    fn acquire(registry_path: &Path) -> Result<Self, RegistryError> {
        let lock_path = registry_path.with_extension("json.lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| RegistryError::Io {
                path: lock_path.clone(),
                source,
            })?;
        file.lock_exclusive().map_err(|source| RegistryError::Io {
            path: lock_path,
            source,
        })?;
        Ok(RegistryLock { _file: file })
    }
}

/// Read the registry. A missing file is an empty registry.
pub fn read_registry() -> Result<BTreeMap<String, ProjectEntry>, RegistryError> {
    let path = files::projects_registry_path()?;
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(&path).map_err(|source| RegistryError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|err| RegistryError::Parse {
        path,
        message: err.to_string(),
    })
}

/// Record a resolved project in the registry.
///
/// New names are inserted; a name already registered at the same path is
/// left untouched. A name registered at a different path is a
/// [`RegistryError::Collision`] unless `rename` is set, in which case the
/// entry moves to the new path.
pub fn write_project(project: &ProjectConfig, rename: bool) -> Result<(), RegistryError> {
    let registry_path = files::projects_registry_path()?;
    if let Some(parent) = registry_path.parent() {
        fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let _lock = RegistryLock::acquire(&registry_path)?;

    let mut registry = read_registry()?;
    let name = project.name.as_str();
    match registry.get_mut(name) {
        Some(entry) if entry.path == project.folder => return Ok(()),
        Some(entry) => {
            if !rename {
                return Err(RegistryError::Collision {
                    name: name.to_string(),
                    existing: entry.path.clone(),
                    requested: project.folder.clone(),
                });
            }
            entry.path = project.folder.clone();
        }
        None => {
            registry.insert(
                name.to_string(),
                ProjectEntry {
                    path: project.folder.clone(),
                    registered_at: Utc::now(),
                },
            );
        }
    }

    write_registry_atomic(&registry_path, &registry)
}

/// Write the registry atomically: temp file in the same directory, fsync,
/// rename over the target.
fn write_registry_atomic(
    path: &Path,
    registry: &BTreeMap<String, ProjectEntry>,
) -> Result<(), RegistryError> {
    let contents = serde_json::to_string_pretty(registry).map_err(RegistryError::Encode)?;

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|source| RegistryError::Io {
        path: temp_path.clone(),
        source,
    })?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|source| RegistryError::Io {
            path: temp_path.clone(),
            source,
        })?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}
