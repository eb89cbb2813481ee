//! config::loader
//!
//! Loads the system configuration: user-level settings plus the resolved
//! project and its app document.
//!
//! # Loading sequence
//!
//! 1. Read the user configuration file; a missing file is the recoverable
//!    [`ConfigError::NotFound`].
//! 2. Optionally refresh blueprint repositories (`--update`).
//! 3. Locate the project file: an explicit `-p` path must exist, otherwise
//!    the working directory and its ancestors are searched and absence is
//!    not an error.
//! 4. Resolve the app document the project file references, searching the
//!    project folder and cached repositories.
//! 5. Parse everything into a [`SystemConfig`].
//!
//! Raw file schemas live here and never leak to callers; handlers see only
//! the loaded model from [`crate::config`].

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use super::files::{self, FilesError};
use super::{AppConfig, ProjectConfig, ProjectName, SystemConfig};

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No user configuration file exists yet. Recoverable: the CLI keeps
    /// running with reduced functionality.
    #[error("no riptide configuration file was found")]
    NotFound,

    /// The project file references an app document that is not present in
    /// the project folder or any cached repository.
    #[error("referenced document '{reference}' could not be found ({} locations searched)", searched.len())]
    ReferencedDocumentNotFound {
        reference: String,
        searched: Vec<PathBuf>,
    },

    /// An explicit `-p` path does not point at a file.
    #[error("project file '{}' does not exist", .0.display())]
    ProjectFileMissing(PathBuf),

    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to create '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to canonicalize project folder '{}': {source}", path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to update repository '{url}': {message}")]
    RepositoryUpdate { url: String, message: String },

    #[error(transparent)]
    Files(#[from] FilesError),
}

/// Raw schema of the user configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserConfigFile {
    #[serde(default = "default_engine")]
    engine: String,
    #[serde(default)]
    repos: Vec<String>,
}

fn default_engine() -> String {
    "docker".to_string()
}

/// Raw schema of a project file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    name: ProjectName,
    /// Reference to the app document, resolved by [`resolve_document`].
    app: String,
}

/// Load the system configuration.
///
/// `project_override` is the `-p` path if one was given. When
/// `update_repositories` is set, cached blueprint repositories are
/// refreshed before documents are resolved; `progress` receives one line
/// per repository.
///
/// # Errors
///
/// [`ConfigError::NotFound`] when no user configuration exists; the other
/// variants are genuine failures.
pub fn load_config(
    project_override: Option<&Path>,
    update_repositories: bool,
    progress: &mut dyn FnMut(&str),
) -> Result<SystemConfig, ConfigError> {
    let user_path = files::user_config_path()?;
    if !user_path.is_file() {
        return Err(ConfigError::NotFound);
    }
    let user: UserConfigFile = read_toml(&user_path)?;

    if update_repositories {
        refresh_repositories(&user.repos, progress)?;
    }

    let project = match locate_project_file(project_override)? {
        Some(path) => Some(load_project(&path)?),
        None => None,
    };

    Ok(SystemConfig {
        engine: user.engine,
        repos: user.repos,
        project,
    })
}

fn locate_project_file(project_override: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = project_override {
        if !path.is_file() {
            return Err(ConfigError::ProjectFileMissing(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let cwd = env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(files::find_project_file(&cwd))
}

fn load_project(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let file: ProjectFile = read_toml(path)?;

    let folder = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    // Canonical so registry entries compare equal regardless of how the
    // project was reached.
    let folder = folder
        .canonicalize()
        .map_err(|source| ConfigError::Canonicalize {
            path: folder.clone(),
            source,
        })?;

    let app_path = resolve_document(&folder, &file.app)?;
    let app: AppConfig = read_toml(&app_path)?;

    Ok(ProjectConfig {
        name: file.name,
        folder,
        app,
    })
}

/// Resolve an app document reference to a file.
///
/// Relative references are tried against the project folder first, then
/// against every cached repository checkout; a reference without an
/// extension also matches with `.toml` appended. Absolute references are
/// used as-is.
fn resolve_document(project_folder: &Path, reference: &str) -> Result<PathBuf, ConfigError> {
    let raw = Path::new(reference);
    let mut candidates = Vec::new();

    if raw.is_absolute() {
        candidates.push(raw.to_path_buf());
    } else {
        let mut push_variants = |base: &Path| {
            candidates.push(base.join(raw));
            if raw.extension().is_none() {
                candidates.push(base.join(format!("{reference}.toml")));
            }
        };
        push_variants(project_folder);
        for repo_dir in cached_repo_dirs() {
            push_variants(&repo_dir);
        }
    }

    for candidate in &candidates {
        if candidate.is_file() {
            return Ok(candidate.clone());
        }
    }

    Err(ConfigError::ReferencedDocumentNotFound {
        reference: reference.to_string(),
        searched: candidates,
    })
}

fn cached_repo_dirs() -> Vec<PathBuf> {
    let Ok(cache) = files::repos_cache_dir() else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(&cache) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// Clone or fast-forward every configured blueprint repository into the
/// cache directory.
fn refresh_repositories(
    repos: &[String],
    progress: &mut dyn FnMut(&str),
) -> Result<(), ConfigError> {
    if repos.is_empty() {
        return Ok(());
    }
    let cache = files::repos_cache_dir()?;
    fs::create_dir_all(&cache).map_err(|source| ConfigError::CreateDir {
        path: cache.clone(),
        source,
    })?;

    for url in repos {
        let checkout = cache.join(checkout_dir_name(url));
        progress(&format!("Updating repository {url}..."));

        let output = if checkout.join(".git").is_dir() {
            Command::new("git")
                .arg("-C")
                .arg(&checkout)
                .args(["pull", "--ff-only"])
                .output()
        } else {
            Command::new("git")
                .arg("clone")
                .arg(url)
                .arg(&checkout)
                .output()
        };

        match output {
            Ok(out) if out.status.success() => {}
            Ok(out) => {
                return Err(ConfigError::RepositoryUpdate {
                    url: url.clone(),
                    message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                })
            }
            Err(err) => {
                return Err(ConfigError::RepositoryUpdate {
                    url: url.clone(),
                    message: err.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Directory name a repository URL is checked out under. Anything that is
/// not filesystem-safe collapses to `_`.
fn checkout_dir_name(url: &str) -> String {
    url.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
