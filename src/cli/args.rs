//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are accepted before the subcommand:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `-p` / `--project <path>`: Use this project file instead of searching
//! - `-v` / `--verbose`: Full diagnostic traces on errors
//! - `-u` / `--update`: Refresh blueprint repositories before loading
//! - `--rename`: (hidden) move a registered project name to this location
//!
//! The flags deliberately sit on the top-level parser only: the bootstrap
//! consumes them before any subcommand logic runs, and error reporting
//! depends on them having been resolved up front.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::registry::CommandGroup;

/// Riptide - define and run development environments from declarative files
#[derive(Parser, Debug)]
#[command(name = "riptide")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this project file instead of searching the working directory
    #[arg(short, long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Print errors with full diagnostic detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Update blueprint repositories before loading configuration
    #[arg(short, long)]
    pub update: bool,

    /// Re-register an already-known project name at this location
    #[arg(long, hide = true)]
    pub rename: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Base commands: always available ==========
    /// Show configuration, project, and service status
    #[command(
        name = "status",
        long_about = "Show the state of this riptide installation.\n\n\
            Reports whether a configuration file is loaded, which engine is \
            connected, which project (if any) was resolved, and the running \
            state of its services."
    )]
    Status,

    /// Print the loaded configuration as TOML
    #[command(name = "config-dump")]
    ConfigDump,

    /// Create a fresh user configuration file
    #[command(
        name = "config-create-user",
        long_about = "Create a fresh user configuration file.\n\n\
            The file selects the execution engine and lists blueprint \
            repositories. Nothing is overwritten if a configuration already \
            exists."
    )]
    ConfigCreateUser,

    /// Print the shell integration hook for your shell profile
    #[command(
        name = "shell-init",
        after_help = "\
SETUP:
    # bash (~/.bashrc)
    eval \"$(riptide shell-init bash)\"

    # zsh (~/.zshrc)
    eval \"$(riptide shell-init zsh)\""
    )]
    ShellInit {
        /// Shell to generate the hook for
        #[arg(value_enum)]
        shell: HookShell,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    // ========== Project commands: need a resolved project ==========
    /// Start project services
    #[command(
        name = "start",
        long_about = "Start services of the current project.\n\n\
            With no arguments every service of the app is started; name \
            services to start a subset. Requires the project to be set up \
            (see 'riptide setup').",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start everything
    riptide start

    # Start only the database
    riptide start db"
    )]
    Start {
        /// Services to start (all when omitted)
        services: Vec<String>,
    },

    /// Stop project services
    Stop {
        /// Services to stop (all when omitted)
        services: Vec<String>,
    },

    /// Restart project services
    Restart {
        /// Services to restart (all when omitted)
        services: Vec<String>,
    },

    /// Prepare the project for first use
    #[command(
        name = "setup",
        long_about = "Prepare the current project for first use.\n\n\
            Creates the project's metadata directory and marks the project \
            as set up. Most project commands refuse to run before setup so \
            that half-initialized projects fail loudly instead of strangely."
    )]
    Setup {
        /// Run setup again even if the project is already set up
        #[arg(long)]
        force: bool,
    },

    /// Run an app-defined command inside its service
    #[command(
        name = "cmd",
        after_help = "\
WORKFLOW EXAMPLES:
    # Run the app's 'manage' command
    riptide cmd manage migrate

    # With shell integration enabled, simply:
    manage migrate"
    )]
    Cmd {
        /// Command name as defined by the app document
        name: String,

        /// Extra arguments appended to the configured command line
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    // ========== Database commands: need a loaded configuration ==========
    /// Manage database environments
    #[command(
        name = "db",
        long_about = "Manage database environments.\n\n\
            A project's database service can keep several named \
            environments (for example one per feature branch) and switch \
            between them without losing data."
    )]
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    // ========== Import commands: need a loaded configuration ==========
    /// Import files or database dumps into the project
    Import {
        #[command(subcommand)]
        action: ImportAction,
    },
}

impl Command {
    /// User-visible command name, as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::ConfigDump => "config-dump",
            Command::ConfigCreateUser => "config-create-user",
            Command::ShellInit { .. } => "shell-init",
            Command::Completion { .. } => "completion",
            Command::Start { .. } => "start",
            Command::Stop { .. } => "stop",
            Command::Restart { .. } => "restart",
            Command::Setup { .. } => "setup",
            Command::Cmd { .. } => "cmd",
            Command::Db { .. } => "db",
            Command::Import { .. } => "import",
        }
    }

    /// The availability group this command belongs to.
    pub fn group(&self) -> CommandGroup {
        match self {
            Command::Status
            | Command::ConfigDump
            | Command::ConfigCreateUser
            | Command::ShellInit { .. }
            | Command::Completion { .. } => CommandGroup::Base,
            Command::Start { .. }
            | Command::Stop { .. }
            | Command::Restart { .. }
            | Command::Setup { .. }
            | Command::Cmd { .. } => CommandGroup::Project,
            Command::Db { .. } => CommandGroup::Db,
            Command::Import { .. } => CommandGroup::Import,
        }
    }

    /// True for commands that only introspect the CLI itself. The
    /// bootstrap suppresses all warnings and error output for these so
    /// their stdout stays machine-consumable.
    pub fn is_introspection(&self) -> bool {
        matches!(
            self,
            Command::Completion { .. } | Command::ShellInit { .. }
        )
    }
}

/// Database subcommands.
#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// List database environments
    List,

    /// Create a new database environment
    New {
        /// Name of the new environment
        name: String,

        /// Switch to the new environment immediately
        #[arg(long)]
        switch: bool,
    },

    /// Switch to another database environment
    Switch {
        /// Name of the environment to switch to
        name: String,
    },
}

/// Import subcommands.
#[derive(Subcommand, Debug)]
pub enum ImportAction {
    /// Copy files into the project folder
    Files {
        /// File or directory to copy from
        source: PathBuf,

        /// Destination path, relative to the project folder
        target: String,
    },

    /// Import a database dump into the database service
    Db {
        /// Path to the dump file
        dump: PathBuf,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Shells the integration hook can be generated for
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum HookShell {
    Bash,
    Zsh,
}

impl From<HookShell> for crate::shell::Flavor {
    fn from(shell: HookShell) -> Self {
        match shell {
            HookShell::Bash => crate::shell::Flavor::Bash,
            HookShell::Zsh => crate::shell::Flavor::Zsh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn command_names_match_the_clap_definitions() {
        let cli = Cli::command();
        let defined: Vec<&str> = cli.get_subcommands().map(|c| c.get_name()).collect();
        for name in [
            "status",
            "config-dump",
            "config-create-user",
            "shell-init",
            "completion",
            "start",
            "stop",
            "restart",
            "setup",
            "cmd",
            "db",
            "import",
        ] {
            assert!(defined.contains(&name), "{name} is not defined");
        }
    }

    #[test]
    fn groups_partition_the_commands() {
        let base = Command::Status;
        let project = Command::Start { services: vec![] };
        let db = Command::Db {
            action: DbAction::List,
        };
        assert_eq!(base.group(), CommandGroup::Base);
        assert_eq!(project.group(), CommandGroup::Project);
        assert_eq!(db.group(), CommandGroup::Db);
    }

    #[test]
    fn introspection_commands_are_exactly_the_output_generators() {
        assert!(Command::Completion { shell: Shell::Bash }.is_introspection());
        assert!(Command::ShellInit {
            shell: HookShell::Zsh
        }
        .is_introspection());
        assert!(!Command::Status.is_introspection());
        assert!(!Command::Setup { force: false }.is_introspection());
    }
}
