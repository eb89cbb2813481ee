//! cli::commands::db
//!
//! Database environment commands.
//!
//! # Model
//!
//! The project's database service can keep several named environments.
//! Which ones exist and which is current is tracked in
//! `_riptide/db_state.toml`; the engine only ever sees stop/start cycles
//! around a switch.

use std::fs;

use serde::{Deserialize, Serialize};

use crate::config::files;
use crate::config::ProjectConfig;
use crate::context::CliContext;
use crate::error::CliError;
use crate::ui::output;

/// Names registered for the database group.
pub const COMMAND_NAMES: &[&str] = &["db list", "db new", "db switch"];

const DEFAULT_ENVIRONMENT: &str = "default";

/// On-disk bookkeeping for database environments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DbState {
    pub current: String,
    pub environments: Vec<String>,
}

impl Default for DbState {
    fn default() -> Self {
        DbState {
            current: DEFAULT_ENVIRONMENT.to_string(),
            environments: vec![DEFAULT_ENVIRONMENT.to_string()],
        }
    }
}

fn load_state(ctx: &CliContext, project: &ProjectConfig) -> Result<DbState, CliError> {
    let path = files::db_state_path(project.folder());
    if !path.is_file() {
        return Ok(DbState::default());
    }
    let contents = fs::read_to_string(&path).map_err(|err| {
        CliError::with_cause("Failed to read the database state file.", ctx, err)
    })?;
    toml::from_str(&contents).map_err(|err| {
        CliError::with_cause("Failed to parse the database state file.", ctx, err)
    })
}

fn store_state(ctx: &CliContext, project: &ProjectConfig, state: &DbState) -> Result<(), CliError> {
    let path = files::db_state_path(project.folder());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            CliError::with_cause("Failed to create the project metadata directory.", ctx, err)
        })?;
    }
    let contents = toml::to_string_pretty(state).map_err(|err| {
        CliError::with_cause("Failed to encode the database state file.", ctx, err)
    })?;
    fs::write(&path, contents).map_err(|err| {
        CliError::with_cause("Failed to write the database state file.", ctx, err)
    })
}

/// The database service of the project, or a user-facing error.
fn require_db_service<'a>(
    ctx: &CliContext,
    project: &'a ProjectConfig,
) -> Result<&'a str, CliError> {
    project
        .db_service()
        .map(|(name, _)| name)
        .ok_or_else(|| {
            CliError::new(
                "The app does not define a service with the 'db' role.",
                ctx,
            )
        })
}

fn validate_environment_name(ctx: &CliContext, name: &str) -> Result<(), CliError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CliError::new(
            format!(
                "'{name}' is not a valid environment name. Use lowercase letters, \
                 digits, '-' and '_'."
            ),
            ctx,
        ))
    }
}

/// List database environments.
pub fn list(ctx: &CliContext) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let service = require_db_service(ctx, project)?;
    let state = load_state(ctx, project)?;

    output::plain(format!("Database environments for service '{service}':"));
    for environment in &state.environments {
        let marker = if *environment == state.current {
            "*"
        } else {
            " "
        };
        output::plain(format!("{marker} {environment}"));
    }
    Ok(())
}

/// Create a new database environment.
pub fn create(ctx: &CliContext, name: &str, switch_to_it: bool) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    require_db_service(ctx, project)?;
    validate_environment_name(ctx, name)?;

    let mut state = load_state(ctx, project)?;
    if state.environments.iter().any(|env| env == name) {
        return Err(CliError::new(
            format!("Database environment '{name}' already exists."),
            ctx,
        ));
    }
    state.environments.push(name.to_string());
    store_state(ctx, project, &state)?;
    output::plain(format!("Created database environment '{name}'."));

    if switch_to_it {
        switch(ctx, name)?;
    }
    Ok(())
}

/// Switch to another database environment, cycling the database service.
pub fn switch(ctx: &CliContext, name: &str) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let engine = ctx.require_engine()?;
    let service = require_db_service(ctx, project)?;

    let mut state = load_state(ctx, project)?;
    if !state.environments.iter().any(|env| env == name) {
        return Err(CliError::new(
            format!(
                "Unknown database environment '{}'. Existing environments: {}",
                name,
                state.environments.join(", ")
            ),
            ctx,
        ));
    }
    if state.current == name {
        output::plain(format!("Already on database environment '{name}'."));
        return Ok(());
    }

    let selection = vec![service.to_string()];
    ctx.block_on(engine.stop(project, &selection))?
        .map_err(|err| {
            CliError::with_cause("Failed to stop the database service.", ctx, err)
        })?;

    state.current = name.to_string();
    store_state(ctx, project, &state)?;

    ctx.block_on(engine.start(project, &selection))?
        .map_err(|err| {
            CliError::with_cause("Failed to start the database service.", ctx, err)
        })?;

    output::plain(format!("Switched to database environment '{name}'."));
    Ok(())
}
