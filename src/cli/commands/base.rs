//! cli::commands::base
//!
//! Commands that are available regardless of configuration state.

use std::fs;
use std::io;

use clap::CommandFactory;
use clap_complete::{generate, shells};

use crate::cli::args::{Cli, HookShell, Shell};
use crate::config::{files, projects};
use crate::context::CliContext;
use crate::error::CliError;
use crate::shell;
use crate::ui::output;

/// Command suggested to users who have no configuration file yet.
pub const COMMAND_CREATE_CONFIG_USER: &str = "config-create-user";

/// Names registered for the base group.
pub const COMMAND_NAMES: &[&str] = &[
    "status",
    "config-dump",
    COMMAND_CREATE_CONFIG_USER,
    "shell-init",
    "completion",
];

const USER_CONFIG_TEMPLATE: &str = r#"# riptide user configuration.

# Execution backend used to run project services.
# Supported: "docker" (needs a reachable docker daemon),
#            "dummy"  (in-memory, for tests and dry runs).
engine = "docker"

# Blueprint repositories (git URLs) that app documents can be resolved
# from. Refresh the local checkouts with `riptide -u <command>`.
repos = []
"#;

/// Create a fresh user configuration file.
pub fn config_create_user(ctx: &CliContext) -> Result<(), CliError> {
    let path = files::user_config_path().map_err(|err| {
        CliError::with_cause("Could not determine the configuration directory.", ctx, err)
    })?;

    if path.is_file() {
        output::plain(format!(
            "You already have a configuration file at {}.",
            path.display()
        ));
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            CliError::with_cause("Failed to create the configuration directory.", ctx, err)
        })?;
    }
    fs::write(&path, USER_CONFIG_TEMPLATE).map_err(|err| {
        CliError::with_cause("Failed to write the configuration file.", ctx, err)
    })?;

    output::plain(format!("Created {}.", path.display()));
    output::plain("Edit it to pick an engine and add blueprint repositories.");
    Ok(())
}

/// Print the loaded configuration as TOML.
pub fn config_dump(ctx: &CliContext) -> Result<(), CliError> {
    let Some(system) = &ctx.system_config else {
        return Err(CliError::new(
            format!(
                "No configuration is loaded. Use '{COMMAND_CREATE_CONFIG_USER}' to create one."
            ),
            ctx,
        ));
    };
    let rendered = toml::to_string_pretty(system)
        .map_err(|err| CliError::with_cause("Failed to render the configuration.", ctx, err))?;
    output::plain(rendered);
    Ok(())
}

/// Show configuration, project, and service status.
pub fn status(ctx: &CliContext) -> Result<(), CliError> {
    output::plain(format!("riptide {}", env!("CARGO_PKG_VERSION")));
    output::blank();

    match &ctx.system_config {
        None => {
            output::plain(format!(
                "Configuration: none (use '{COMMAND_CREATE_CONFIG_USER}' to create one)"
            ));
        }
        Some(system) => {
            output::plain(format!("Configuration: loaded, engine '{}'", system.engine_name()));
            match &ctx.engine {
                Some(engine) => output::plain(format!("Engine: '{}' connected", engine.name())),
                None => output::plain("Engine: not connected"),
            }

            match system.project() {
                None => output::plain("Project: none found"),
                Some(project) => {
                    output::plain(format!(
                        "Project: '{}' at {}",
                        project.name,
                        project.folder().display()
                    ));
                    let set_up = matches!(ctx.project_is_set_up, Some(true));
                    output::plain(format!(
                        "Setup: {}",
                        if set_up { "complete" } else { "not run (riptide setup)" }
                    ));
                    print_service_status(ctx);
                }
            }
        }
    }

    output::blank();
    output::plain(format!(
        "Shell integration: {}",
        if shell::integration_is_loaded() {
            "active"
        } else {
            "not enabled (riptide shell-init)"
        }
    ));

    print_known_projects();
    print_registered_groups(ctx);
    Ok(())
}

fn print_service_status(ctx: &CliContext) {
    let (Some(project), Some(engine)) = (ctx.project(), ctx.engine.as_deref()) else {
        return;
    };
    match ctx.block_on(engine.status(project)) {
        Ok(Ok(statuses)) => {
            output::plain("Services:");
            for (name, status) in statuses {
                output::plain(format!("{}{}: {}", output::TAB, name, status));
            }
        }
        Ok(Err(err)) => output::plain(format!("Services: status unavailable ({err})")),
        Err(err) => output::plain(format!("Services: status unavailable ({err})")),
    }
}

fn print_known_projects() {
    let Ok(registry) = projects::read_registry() else {
        return;
    };
    if registry.is_empty() {
        return;
    }
    output::blank();
    output::plain("Known projects:");
    for (name, entry) in registry {
        output::plain(format!(
            "{}{}: {}",
            output::TAB,
            name,
            entry.path.display()
        ));
    }
}

fn print_registered_groups(ctx: &CliContext) {
    output::blank();
    output::plain("Available commands:");
    for group in ctx.registry.groups() {
        output::plain(format!(
            "{}{}: {}",
            output::TAB,
            group.section(),
            group.commands().join(", ")
        ));
    }
}

/// Print the shell integration hook.
pub fn shell_init(shell: HookShell) -> Result<(), CliError> {
    print!("{}", shell::hook_script(shell.into()));
    Ok(())
}

/// Generate shell completion scripts.
pub fn completion(shell: Shell) -> Result<(), CliError> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        Shell::Bash => {
            generate(shells::Bash, &mut cmd, &name, &mut io::stdout());
        }
        Shell::Zsh => {
            generate(shells::Zsh, &mut cmd, &name, &mut io::stdout());
        }
        Shell::Fish => {
            generate(shells::Fish, &mut cmd, &name, &mut io::stdout());
        }
        Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, &name, &mut io::stdout());
        }
    }

    Ok(())
}
