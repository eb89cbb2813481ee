//! shell
//!
//! Shell integration: the sourced hook and per-project alias scripts.
//!
//! # How it works
//!
//! `riptide shell-init bash|zsh` prints a hook for the user's shell
//! profile. The hook exports `RIPTIDE_SHELL_LOADED` (which the bootstrap
//! checks to decide whether to warn) and installs a prompt hook that
//! sources the nearest project's generated alias script, so app commands
//! become plain shell aliases inside project directories.
//!
//! The alias scripts themselves live in `_riptide/shell/` and are
//! regenerated by the bootstrap whenever a project is resolved, keeping
//! them in sync with the app document without a separate refresh command.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::files;
use crate::config::ProjectConfig;

/// Environment variable exported by the shell hook. Presence means the
/// integration is active in the invoking shell.
pub const SHELL_LOADED_ENV: &str = "RIPTIDE_SHELL_LOADED";

/// Shell dialects the hook can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Bash,
    Zsh,
}

impl Flavor {
    fn alias_file(self) -> &'static str {
        match self {
            Flavor::Bash => "aliases.bash",
            Flavor::Zsh => "aliases.zsh",
        }
    }
}

/// Errors from shell script generation.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether the shell hook is active in the invoking shell.
pub fn integration_is_loaded() -> bool {
    std::env::var_os(SHELL_LOADED_ENV).is_some()
}

/// The hook to be sourced from the user's shell profile.
pub fn hook_script(flavor: Flavor) -> String {
    let mut script = format!(
        r#"# riptide shell integration. Add to your shell profile:
#   eval "$(riptide shell-init {shell})"
export {env}=1

_riptide_source_aliases() {{
    local dir="$PWD"
    while [ -n "$dir" ] && [ "$dir" != "/" ]; do
        if [ -f "$dir/{meta}/shell/{alias_file}" ]; then
            . "$dir/{meta}/shell/{alias_file}"
            return
        fi
        dir="${{dir%/*}}"
    done
}}
"#,
        shell = match flavor {
            Flavor::Bash => "bash",
            Flavor::Zsh => "zsh",
        },
        env = SHELL_LOADED_ENV,
        meta = files::META_DIR_NAME,
        alias_file = flavor.alias_file(),
    );

    match flavor {
        Flavor::Bash => {
            script.push_str(
                r#"
if [[ "$PROMPT_COMMAND" != *_riptide_source_aliases* ]]; then
    PROMPT_COMMAND="_riptide_source_aliases${PROMPT_COMMAND:+;$PROMPT_COMMAND}"
fi
"#,
            );
        }
        Flavor::Zsh => {
            script.push_str(
                r#"
autoload -Uz add-zsh-hook
add-zsh-hook precmd _riptide_source_aliases
"#,
            );
        }
    }
    script
}

/// Regenerate the alias scripts under `_riptide/shell/` for a project.
///
/// Returns the paths written. One script per supported flavor; both map
/// every app command to a `riptide cmd` invocation.
pub fn update_project_scripts(project: &ProjectConfig) -> Result<Vec<PathBuf>, ShellError> {
    let dir = files::shell_dir(project.folder());
    fs::create_dir_all(&dir).map_err(|source| ShellError::Write {
        path: dir.clone(),
        source,
    })?;

    let script = aliases_script(project);
    let mut written = Vec::new();
    for flavor in [Flavor::Bash, Flavor::Zsh] {
        let path = dir.join(flavor.alias_file());
        fs::write(&path, &script).map_err(|source| ShellError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

fn aliases_script(project: &ProjectConfig) -> String {
    let mut script = String::from("# Generated by riptide; do not edit.\n");
    script.push_str(&format!("# Project: {}\n", project.name));
    for name in project.app.commands.keys() {
        script.push_str(&format!("alias {name}='riptide cmd {name}'\n"));
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testutil::project_fixture;
    use tempfile::TempDir;

    #[test]
    fn hook_exports_the_marker_and_walks_directories() {
        for flavor in [Flavor::Bash, Flavor::Zsh] {
            let script = hook_script(flavor);
            assert!(script.contains("export RIPTIDE_SHELL_LOADED=1"));
            assert!(script.contains("_riptide/shell/"));
        }
        assert!(hook_script(Flavor::Bash).contains("PROMPT_COMMAND"));
        assert!(hook_script(Flavor::Zsh).contains("add-zsh-hook"));
    }

    #[test]
    fn alias_scripts_cover_every_app_command() {
        let temp = TempDir::new().unwrap();
        let project = project_fixture(temp.path());

        let written = update_project_scripts(&project).unwrap();
        assert_eq!(written.len(), 2);

        let bash = fs::read_to_string(&written[0]).unwrap();
        assert!(bash.contains("alias hello='riptide cmd hello'"));
        assert!(bash.starts_with("# Generated by riptide"));
    }

    #[test]
    fn scripts_land_in_the_meta_directory() {
        let temp = TempDir::new().unwrap();
        let project = project_fixture(temp.path());

        update_project_scripts(&project).unwrap();
        assert!(temp
            .path()
            .join("_riptide/shell/aliases.bash")
            .is_file());
        assert!(temp.path().join("_riptide/shell/aliases.zsh").is_file());
    }
}
