//! cli::bootstrap
//!
//! The once-per-invocation bootstrap sequence that runs before the
//! selected subcommand.
//!
//! # Sequence
//!
//! 1. Populate the global options on the context
//! 2. Load the system and project configuration
//! 3. Record the project in the registry, read its setup marker, and load
//!    the engine
//! 4. Check for the shell integration marker
//! 5. Register the command groups this invocation may dispatch to and
//!    refresh the project's shell scripts
//!
//! # Failure policy
//!
//! Steps are strictly ordered; nothing after a failed step runs. A step
//! either succeeds, degrades to a warning (missing configuration file,
//! missing project, missing shell integration, unwritable shell scripts),
//! or halts with a [`CliError`] (unresolvable document reference,
//! unparsable configuration, registry collision, unknown engine,
//! unreachable engine). Warnings never change control flow or the exit
//! status, and resilient parsing mode prints no warnings, repository
//! progress, or debug diagnostics at all.

use std::env;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{base, db, import_cmd, project, CommandGroup, Section};
use crate::config::files;
use crate::config::loader::{self, ConfigError};
use crate::config::projects::{self, RegistryError};
use crate::context::{CliContext, GlobalOptions};
use crate::engine::{self, EngineLoadError};
use crate::error::CliError;
use crate::shell;
use crate::ui::output;

/// Run the bootstrap sequence, leaving the context ready for dispatch.
pub fn load_cli(ctx: &mut CliContext, cli: &Cli) -> Result<(), CliError> {
    // Step 1: options. Everything downstream, including error rendering,
    // reads verbosity from the context.
    ctx.populate_options(GlobalOptions {
        project: cli.project.clone(),
        verbose: cli.verbose,
        update: cli.update,
        rename: cli.rename,
    });
    let resilient = ctx.resilient_parsing;
    let verbose = ctx.is_verbose() && !resilient;

    // Step 2: configuration. Repository refresh progress goes to stdout,
    // which resilient parsing reserves for the command's own output.
    let system_config = match loader::load_config(cli.project.as_deref(), cli.update, &mut |line| {
        if !resilient {
            output::plain(line);
        }
    }) {
        Ok(config) => Some(config),
        Err(ConfigError::NotFound) => {
            // Stay quiet when the user is about to create the file anyway.
            let about_to_create = matches!(cli.command, Command::ConfigCreateUser);
            if !about_to_create && !resilient {
                output::warn(format!(
                    "You don't have a configuration file for riptide yet. \
                     Use '{}' to create one.",
                    base::COMMAND_CREATE_CONFIG_USER
                ));
            }
            None
        }
        Err(err @ ConfigError::ReferencedDocumentNotFound { .. }) => {
            let mut message = String::from(
                "Failed to load the project because a referenced document could not be found.",
            );
            if !cli.update {
                let argv: Vec<String> = env::args().collect();
                message.push_str(
                    "\n\nMake sure your repositories are up to date by re-running \
                     this command with --update:\n",
                );
                message.push_str(output::TAB);
                message.push_str(&update_rerun_hint(&argv));
            }
            return Err(CliError::with_cause(message, ctx, err));
        }
        Err(err) => {
            return Err(CliError::with_cause(
                "Error parsing the system or project configuration.",
                ctx,
                err,
            ));
        }
    };

    // Step 3: project registration and engine, only with a configuration.
    if let Some(system) = &system_config {
        match system.project() {
            None => {
                if !resilient {
                    output::warn(
                        "No project found. Are you running riptide inside a project directory?",
                    );
                }
            }
            Some(project_config) => {
                match projects::write_project(project_config, cli.rename) {
                    Ok(()) => {}
                    Err(err @ RegistryError::Collision { .. }) => {
                        // The collision text is the user-facing message.
                        return Err(CliError::with_cause(err.to_string(), ctx, err));
                    }
                    Err(err) => {
                        return Err(CliError::with_cause(
                            "Failed to update the project registry.",
                            ctx,
                            err,
                        ));
                    }
                }
                ctx.project_is_set_up =
                    Some(files::setup_flag_path(project_config.folder()).exists());
                output::debug(
                    format!("project '{}' registered", project_config.name),
                    verbose,
                );
            }
        }

        match engine::load_engine(system.engine_name()) {
            Ok(engine) => {
                output::debug(format!("engine '{}' connected", engine.name()), verbose);
                ctx.engine = Some(engine);
            }
            Err(err @ EngineLoadError::Unsupported(_)) => {
                return Err(CliError::with_cause(
                    "Unknown engine specified in configuration.",
                    ctx,
                    err,
                ));
            }
            Err(err @ EngineLoadError::Connection { .. }) => {
                return Err(CliError::with_cause("Connection to engine failed.", ctx, err));
            }
        }
    }
    ctx.system_config = system_config;

    // Step 4: shell integration marker.
    if !shell::integration_is_loaded() && !resilient {
        output::warn("riptide shell integration not enabled.");
    }

    // Step 5: command groups for this invocation.
    ctx.registry.register(
        CommandGroup::Base,
        Section::new("General"),
        base::COMMAND_NAMES,
    );
    if let Some(system) = &ctx.system_config {
        ctx.registry.register(
            CommandGroup::Db,
            Section::new("Database"),
            db::COMMAND_NAMES,
        );
        ctx.registry.register(
            CommandGroup::Import,
            Section::new("Import"),
            import_cmd::COMMAND_NAMES,
        );
        if let Some(project_config) = system.project() {
            ctx.registry.register(
                CommandGroup::Project,
                Section::new("Project"),
                project::COMMAND_NAMES,
            );
            // Keep shell aliases in sync with the app document. Failure
            // here must not take the invocation down.
            if let Err(err) = shell::update_project_scripts(project_config) {
                if !resilient {
                    output::warn(format!("Could not update shell integration scripts: {err}"));
                }
            }
        }
    }

    Ok(())
}

/// The invocation's argv re-echoed with `--update` inserted right after
/// the program name, for the "re-run with --update" hint.
fn update_rerun_hint(argv: &[String]) -> String {
    let mut args: Vec<String> = argv.to_vec();
    let insert_at = if args.is_empty() { 0 } else { 1 };
    args.insert(insert_at, "--update".to_string());
    args.join(" ")
}
