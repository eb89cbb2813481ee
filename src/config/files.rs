//! config::files
//!
//! Centralized path routing for riptide storage locations.
//!
//! # Storage Layout
//!
//! User-level state lives in the riptide configuration directory
//! (`$RIPTIDE_CONFIG_DIR`, or the platform configuration directory plus
//! `riptide/`):
//! - `config.toml` - User configuration
//! - `projects.json` - Project name registry
//! - `repos/` - Cached blueprint repository checkouts
//!
//! Project-level state lives in `_riptide/` next to the project file:
//! - `setup_flag` - Present once `setup` has completed
//! - `shell/` - Generated shell alias scripts
//! - `db_state.toml` - Database environment bookkeeping
//! - `imports/` - Staged database dumps
//!
//! No code outside this module should compute these paths itself.

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the project file searched for in the working directory and its
/// ancestors.
pub const PROJECT_FILE_NAME: &str = "riptide.toml";

/// Name of the per-project metadata directory next to the project file.
pub const META_DIR_NAME: &str = "_riptide";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "RIPTIDE_CONFIG_DIR";

/// Errors from path resolution.
#[derive(Debug, Error)]
pub enum FilesError {
    #[error("could not determine the riptide configuration directory")]
    NoConfigDir,
}

/// The riptide configuration directory.
///
/// Resolution order:
/// 1. `$RIPTIDE_CONFIG_DIR` if set
/// 2. The platform configuration directory plus `riptide/`
pub fn riptide_config_dir() -> Result<PathBuf, FilesError> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("riptide"))
        .ok_or(FilesError::NoConfigDir)
}

/// Path of the user configuration file.
pub fn user_config_path() -> Result<PathBuf, FilesError> {
    Ok(riptide_config_dir()?.join("config.toml"))
}

/// Path of the project registry.
pub fn projects_registry_path() -> Result<PathBuf, FilesError> {
    Ok(riptide_config_dir()?.join("projects.json"))
}

/// Directory holding cached blueprint repository checkouts.
pub fn repos_cache_dir() -> Result<PathBuf, FilesError> {
    Ok(riptide_config_dir()?.join("repos"))
}

/// Find the nearest project file at or above `start`.
pub fn find_project_file(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(PROJECT_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// The `_riptide/` metadata directory of a project.
pub fn meta_dir(project_folder: &Path) -> PathBuf {
    project_folder.join(META_DIR_NAME)
}

/// Marker file recording that `setup` has completed for a project.
pub fn setup_flag_path(project_folder: &Path) -> PathBuf {
    meta_dir(project_folder).join("setup_flag")
}

/// Directory holding generated shell alias scripts for a project.
pub fn shell_dir(project_folder: &Path) -> PathBuf {
    meta_dir(project_folder).join("shell")
}

/// Database environment bookkeeping file for a project.
pub fn db_state_path(project_folder: &Path) -> PathBuf {
    meta_dir(project_folder).join("db_state.toml")
}

/// Directory where database dumps are staged before import.
pub fn imports_dir(project_folder: &Path) -> PathBuf {
    meta_dir(project_folder).join("imports")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testutil::ScopedConfigDir;
    use tempfile::TempDir;

    #[test]
    fn env_override_wins() {
        let temp = TempDir::new().unwrap();
        let _env = ScopedConfigDir::set(temp.path());

        assert_eq!(riptide_config_dir().unwrap(), temp.path());
        assert_eq!(
            user_config_path().unwrap(),
            temp.path().join("config.toml")
        );
        assert_eq!(
            projects_registry_path().unwrap(),
            temp.path().join("projects.json")
        );
        assert_eq!(repos_cache_dir().unwrap(), temp.path().join("repos"));
    }

    #[test]
    fn project_file_search_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        let project_file = temp.path().join("a").join(PROJECT_FILE_NAME);
        std::fs::write(&project_file, "").unwrap();

        assert_eq!(find_project_file(&nested), Some(project_file.clone()));
        assert_eq!(
            find_project_file(&temp.path().join("a")),
            Some(project_file)
        );
        assert_eq!(find_project_file(&temp.path().join("elsewhere")), None);
    }

    #[test]
    fn meta_paths_nest_under_the_project() {
        let folder = Path::new("/work/shop");
        assert_eq!(meta_dir(folder), Path::new("/work/shop/_riptide"));
        assert_eq!(
            setup_flag_path(folder),
            Path::new("/work/shop/_riptide/setup_flag")
        );
        assert_eq!(
            shell_dir(folder),
            Path::new("/work/shop/_riptide/shell")
        );
        assert_eq!(
            db_state_path(folder),
            Path::new("/work/shop/_riptide/db_state.toml")
        );
        assert_eq!(
            imports_dir(folder),
            Path::new("/work/shop/_riptide/imports")
        );
    }
}
