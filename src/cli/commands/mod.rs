//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Asks the context for what it needs (project, engine, setup state)
//! 2. Performs the operation, async bodies through the context scheduler
//! 3. Formats and displays output
//!
//! # Availability
//!
//! Dispatch checks the invocation's [`registry::CommandRegistry`] before
//! calling a handler. A command whose group was not registered fails with
//! a message explaining what is missing (a configuration file or a
//! project), so handlers never see a state their group's registration did
//! not guarantee.

pub mod base;
pub mod db;
pub mod import_cmd;
pub mod project;
pub mod registry;

pub use registry::{CommandGroup, CommandRegistry, Section};

use crate::cli::args::{Command, DbAction, ImportAction};
use crate::config::files;
use crate::context::CliContext;
use crate::error::CliError;

/// Dispatch a command to its handler.
pub fn dispatch(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    ensure_available(ctx, &command)?;

    match command {
        Command::Status => base::status(ctx),
        Command::ConfigDump => base::config_dump(ctx),
        Command::ConfigCreateUser => base::config_create_user(ctx),
        Command::ShellInit { shell } => base::shell_init(shell),
        Command::Completion { shell } => base::completion(shell),

        Command::Start { services } => project::start(ctx, &services),
        Command::Stop { services } => project::stop(ctx, &services),
        Command::Restart { services } => project::restart(ctx, &services),
        Command::Setup { force } => project::setup(ctx, force),
        Command::Cmd { name, args } => project::cmd(ctx, &name, &args),

        Command::Db { action } => match action {
            DbAction::List => db::list(ctx),
            DbAction::New { name, switch } => db::create(ctx, &name, switch),
            DbAction::Switch { name } => db::switch(ctx, &name),
        },

        Command::Import { action } => match action {
            ImportAction::Files { source, target } => import_cmd::files(ctx, &source, &target),
            ImportAction::Db { dump } => import_cmd::db(ctx, &dump),
        },
    }
}

/// Fail with a targeted message when the command's group was not
/// registered for this invocation.
fn ensure_available(ctx: &CliContext, command: &Command) -> Result<(), CliError> {
    let group = command.group();
    if ctx.registry.is_registered(group) {
        return Ok(());
    }

    let message = match group {
        CommandGroup::Project if ctx.system_config.is_some() => format!(
            "The '{}' command requires a project. Run it from a directory containing \
             a {} file, or pass -p/--project.",
            command.name(),
            files::PROJECT_FILE_NAME
        ),
        _ => format!(
            "The '{}' command requires a loaded riptide configuration. Use '{}' to \
             create one.",
            command.name(),
            base::COMMAND_CREATE_CONFIG_USER
        ),
    };
    Err(CliError::new(message, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::Command;
    use crate::context::{CliContext, GlobalOptions};

    fn quiet_ctx() -> CliContext {
        let mut ctx = CliContext::new();
        ctx.populate_options(GlobalOptions::default());
        ctx
    }

    #[test]
    fn unregistered_project_group_without_config_points_at_config_creation() {
        let ctx = quiet_ctx();
        let err = dispatch(&ctx, Command::Start { services: vec![] }).unwrap_err();
        assert!(err.message().contains("requires a loaded riptide configuration"));
        assert!(err.message().contains(base::COMMAND_CREATE_CONFIG_USER));
    }

    #[test]
    fn unregistered_db_group_without_config_points_at_config_creation() {
        let ctx = quiet_ctx();
        let err = dispatch(
            &ctx,
            Command::Db {
                action: crate::cli::args::DbAction::List,
            },
        )
        .unwrap_err();
        assert!(err.message().contains("requires a loaded riptide configuration"));
    }
}
