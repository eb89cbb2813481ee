//! config
//!
//! Configuration model for riptide.
//!
//! # Modules
//!
//! - [`files`] - Filesystem layout: configuration directory and project files
//! - [`loader`] - Loads user configuration and resolves the project
//! - [`projects`] - The persistent name-to-path project registry
//!
//! # Model
//!
//! A [`SystemConfig`] is the fully loaded view of one invocation: the
//! user-level settings plus, when one was found, the resolved
//! [`ProjectConfig`] with its app document. Handlers only ever see this
//! loaded form; raw file schemas stay private to the loader.

pub mod files;
pub mod loader;
pub mod projects;

pub use loader::{load_config, ConfigError};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service role marking the database container of a project.
pub const ROLE_DB: &str = "db";

/// Errors from configuration type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid project name: {0}")]
    InvalidProjectName(String),
}

/// A validated project name.
///
/// Project names become container name segments and registry keys, so they
/// are restricted to lowercase ASCII letters, digits, `-` and `_`, must
/// start with a letter or digit, and may be at most 64 characters long.
///
/// # Example
///
/// ```
/// use riptide_cli::config::ProjectName;
///
/// let name = ProjectName::new("my-shop_2").unwrap();
/// assert_eq!(name.as_str(), "my-shop_2");
///
/// assert!(ProjectName::new("").is_err());
/// assert!(ProjectName::new("My-Shop").is_err());
/// assert!(ProjectName::new("-leading-dash").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// Create a new validated project name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidProjectName` if the name violates the
    /// naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidProjectName(
                "project name cannot be empty".into(),
            ));
        }

        if name.len() > 64 {
            return Err(TypeError::InvalidProjectName(
                "project name cannot exceed 64 characters".into(),
            ));
        }

        let mut chars = name.chars();
        // First character feeds container naming, which rejects leading
        // separators.
        if let Some(first) = chars.next() {
            if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
                return Err(TypeError::InvalidProjectName(format!(
                    "project name must start with a lowercase letter or digit, got '{}'",
                    first
                )));
            }
        }

        for c in chars {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '_' {
                return Err(TypeError::InvalidProjectName(format!(
                    "project name contains invalid character '{}'",
                    c
                )));
            }
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> String {
        name.0
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The fully loaded configuration for one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SystemConfig {
    /// Name of the execution backend selected by the user configuration.
    pub engine: String,
    /// Blueprint repositories app documents may be resolved from.
    pub repos: Vec<String>,
    /// The resolved project, when a project file was found.
    pub project: Option<ProjectConfig>,
}

impl SystemConfig {
    pub fn engine_name(&self) -> &str {
        &self.engine
    }

    pub fn project(&self) -> Option<&ProjectConfig> {
        self.project.as_ref()
    }
}

/// A resolved project: its identity, location, and app document.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectConfig {
    pub name: ProjectName,
    /// Canonicalized directory containing the project file.
    pub folder: PathBuf,
    /// The loaded app document the project file referenced.
    pub app: AppConfig,
}

impl ProjectConfig {
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The first service carrying the `db` role, if any.
    pub fn db_service(&self) -> Option<(&str, &ServiceConfig)> {
        self.app
            .services
            .iter()
            .find(|(_, service)| service.has_role(ROLE_DB))
            .map(|(name, service)| (name.as_str(), service))
    }
}

/// An app document: the services and commands a project is made of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Human-readable app name, independent of the project name.
    pub name: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandConfig>,
}

/// One long-running service of an app.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Container image the service runs as.
    pub image: String,
    /// Startup command overriding the image default.
    #[serde(default)]
    pub command: Option<String>,
    /// Roles this service fills, e.g. `db`.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Command run inside the service to ingest a database dump.
    #[serde(default)]
    pub import_command: Option<String>,
}

impl ServiceConfig {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// A short-lived command an app exposes, run inside one of its services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    /// Service the command executes in.
    pub service: String,
    /// Command line to execute.
    pub command: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    mod project_name {
        use super::*;

        #[test]
        fn accepts_typical_names() {
            for name in ["shop", "my-shop", "shop_2", "2048"] {
                assert!(ProjectName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn rejects_bad_names() {
            for name in ["", "My-Shop", "-shop", "_shop", "shop!", "sh op"] {
                assert!(ProjectName::new(name).is_err(), "{name} should be invalid");
            }
        }

        #[test]
        fn rejects_overlong_names() {
            let name = "a".repeat(65);
            assert!(ProjectName::new(name).is_err());
            assert!(ProjectName::new("a".repeat(64)).is_ok());
        }

        #[test]
        fn serde_round_trips_through_string() {
            let name: ProjectName = serde_json::from_str("\"shop\"").unwrap();
            assert_eq!(name.as_str(), "shop");
            assert!(serde_json::from_str::<ProjectName>("\"BAD NAME\"").is_err());
        }
    }

    mod app_config {
        use super::*;

        #[test]
        fn parses_a_full_document() {
            let doc = r#"
                name = "Web Shop"

                [services.web]
                image = "nginx:alpine"
                roles = ["main"]

                [services.db]
                image = "postgres:16"
                roles = ["db"]
                import_command = "pg_restore /tmp/dump"

                [commands.manage]
                service = "web"
                command = "python manage.py"
            "#;
            let app: AppConfig = toml::from_str(doc).unwrap();
            assert_eq!(app.name, "Web Shop");
            assert_eq!(app.services.len(), 2);
            assert!(app.services["db"].has_role(ROLE_DB));
            assert_eq!(app.commands["manage"].service, "web");
        }

        #[test]
        fn unknown_fields_are_rejected() {
            let doc = r#"
                name = "Web Shop"
                no_such_field = true
            "#;
            assert!(toml::from_str::<AppConfig>(doc).is_err());
        }

        #[test]
        fn db_service_finds_the_role() {
            let temp = tempfile::tempdir().unwrap();
            let project = testutil::project_fixture(temp.path());
            let (name, service) = project.db_service().unwrap();
            assert_eq!(name, "db");
            assert!(service.import_command.is_some());
        }
    }
}
