//! cli::commands::project
//!
//! Project-scoped commands: service lifecycle, setup, and app commands.
//!
//! # Setup gating
//!
//! Everything except `setup` itself refuses to run until the project has
//! been set up once. The setup marker is a file in the project's metadata
//! directory, so deleting `_riptide/` resets the project cleanly.

use std::fs;

use chrono::Utc;

use crate::config::files;
use crate::context::CliContext;
use crate::error::CliError;
use crate::ui::output;

/// Names registered for the project group.
pub const COMMAND_NAMES: &[&str] = &["start", "stop", "restart", "setup", "cmd"];

/// Fail unless the resolved project has completed `setup`.
fn ensure_set_up(ctx: &CliContext) -> Result<(), CliError> {
    if matches!(ctx.project_is_set_up, Some(true)) {
        return Ok(());
    }
    let name = ctx.require_project()?.name.clone();
    Err(CliError::new(
        format!("Project '{name}' is not set up yet. Run 'riptide setup' first."),
        ctx,
    ))
}

/// Start services and report their resulting status.
pub fn start(ctx: &CliContext, services: &[String]) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let engine = ctx.require_engine()?;
    ensure_set_up(ctx)?;

    output::plain(format!("Starting services for project '{}'...", project.name));
    ctx.block_on(engine.start(project, services))?
        .map_err(|err| CliError::with_cause("Failed to start services.", ctx, err))?;
    report_status(ctx)?;
    Ok(())
}

/// Stop services.
pub fn stop(ctx: &CliContext, services: &[String]) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let engine = ctx.require_engine()?;
    ensure_set_up(ctx)?;

    output::plain(format!("Stopping services for project '{}'...", project.name));
    ctx.block_on(engine.stop(project, services))?
        .map_err(|err| CliError::with_cause("Failed to stop services.", ctx, err))?;
    Ok(())
}

/// Stop then start services.
pub fn restart(ctx: &CliContext, services: &[String]) -> Result<(), CliError> {
    stop(ctx, services)?;
    start(ctx, services)
}

/// Prepare the project for first use.
pub fn setup(ctx: &CliContext, force: bool) -> Result<(), CliError> {
    let project = ctx.require_project()?;

    if matches!(ctx.project_is_set_up, Some(true)) && !force {
        output::plain(format!(
            "Project '{}' is already set up. Use --force to run setup again.",
            project.name
        ));
        return Ok(());
    }

    let folder = project.folder();
    for dir in [
        files::meta_dir(folder),
        files::shell_dir(folder),
        files::imports_dir(folder),
    ] {
        fs::create_dir_all(&dir).map_err(|err| {
            CliError::with_cause(
                format!("Failed to create '{}'.", dir.display()),
                ctx,
                err,
            )
        })?;
    }

    let flag = files::setup_flag_path(folder);
    fs::write(&flag, format!("{}\n", Utc::now().to_rfc3339())).map_err(|err| {
        CliError::with_cause("Failed to write the setup marker.", ctx, err)
    })?;

    output::plain(format!(
        "Project '{}' is set up. Start it with 'riptide start'.",
        project.name
    ));
    Ok(())
}

/// Run an app-defined command inside its service.
pub fn cmd(ctx: &CliContext, name: &str, args: &[String]) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let engine = ctx.require_engine()?;
    ensure_set_up(ctx)?;

    let Some(command) = project.app.commands.get(name) else {
        let known: Vec<&str> = project.app.commands.keys().map(String::as_str).collect();
        return Err(CliError::new(
            format!(
                "The app does not define a command named '{}'. Known commands: {}",
                name,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            ),
            ctx,
        ));
    };

    let mut argv: Vec<String> = command
        .command
        .split_whitespace()
        .map(str::to_string)
        .collect();
    argv.extend(args.iter().cloned());

    let code = ctx
        .block_on(engine.exec(project, &command.service, &argv))?
        .map_err(|err| {
            CliError::with_cause(format!("Failed to run command '{name}'."), ctx, err)
        })?;

    if code != 0 {
        return Err(CliError::new(
            format!("Command '{name}' exited with status {code}."),
            ctx,
        ));
    }
    Ok(())
}

fn report_status(ctx: &CliContext) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let engine = ctx.require_engine()?;
    let statuses = ctx
        .block_on(engine.status(project))?
        .map_err(|err| CliError::with_cause("Failed to query service status.", ctx, err))?;
    for (service, status) in statuses {
        output::plain(format!("{}{}: {}", output::TAB, service, status));
    }
    Ok(())
}
