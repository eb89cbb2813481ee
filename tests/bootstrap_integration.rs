//! Integration tests for the bootstrap sequence.
//!
//! These tests run the real binary against scratch configuration and
//! project directories, checking the stream discipline (warnings on
//! stdout, fatal errors on stderr), exit codes, and the side effects of a
//! successful bootstrap: registry entries, setup markers, and generated
//! shell scripts.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

// =============================================================================
// Test Fixtures
// =============================================================================

const APP_DOC: &str = r#"
name = "Web Shop"

[services.web]
image = "nginx:alpine"
roles = ["main"]

[services.db]
image = "postgres:16"
roles = ["db"]
import_command = "pg_restore /tmp/riptide-import.dump"

[commands.hello]
service = "web"
command = "echo hello"
"#;

/// Scratch configuration directory plus a workspace for project folders.
struct Fixture {
    config: TempDir,
    work: TempDir,
}

impl Fixture {
    /// No configuration file at all.
    fn new() -> Self {
        Fixture {
            config: TempDir::new().expect("failed to create config temp dir"),
            work: TempDir::new().expect("failed to create work temp dir"),
        }
    }

    /// A configuration file selecting the given engine.
    fn with_config(engine: &str) -> Self {
        let fixture = Self::new();
        fixture
            .config
            .child("config.toml")
            .write_str(&format!("engine = \"{engine}\"\nrepos = []\n"))
            .expect("failed to write config");
        fixture
    }

    /// Point the configuration at the dummy engine with one blueprint
    /// repository.
    fn write_config_with_repo(&self, repo: &Path) {
        self.config
            .child("config.toml")
            .write_str(&format!(
                "engine = \"dummy\"\nrepos = [\"{}\"]\n",
                repo.display()
            ))
            .expect("failed to write config");
    }

    /// An empty git repository under the work dir, usable as a blueprint
    /// repository source.
    fn blueprint_repo(&self) -> ChildPath {
        let repo = self.work.child("blueprints");
        repo.create_dir_all().expect("failed to create repo dir");
        let init = std::process::Command::new("git")
            .arg("init")
            .arg(repo.path())
            .output()
            .expect("failed to spawn git");
        assert!(init.status.success(), "git init failed");
        repo
    }

    /// Create a project folder with a project file and an app document.
    fn project_dir(&self, sub: &str, name: &str) -> ChildPath {
        let dir = self.project_dir_with_app_ref(sub, name, "app");
        dir.child("app.toml")
            .write_str(APP_DOC)
            .expect("failed to write app document");
        dir
    }

    /// Create a project folder whose project file references `app_ref`.
    fn project_dir_with_app_ref(&self, sub: &str, name: &str, app_ref: &str) -> ChildPath {
        let dir = self.work.child(sub);
        dir.child("riptide.toml")
            .write_str(&format!("name = \"{name}\"\napp = \"{app_ref}\"\n"))
            .expect("failed to write project file");
        dir
    }

    /// An empty folder with no project file anywhere above it.
    fn empty_dir(&self) -> ChildPath {
        let dir = self.work.child("empty");
        dir.create_dir_all().expect("failed to create empty dir");
        dir
    }

    /// A riptide command with shell integration marked active, so tests
    /// that do not care about the shell warning stay quiet.
    fn riptide(&self, cwd: impl AsRef<Path>) -> Command {
        let mut cmd = Command::cargo_bin("riptide").expect("binary exists");
        cmd.env("RIPTIDE_CONFIG_DIR", self.config.path())
            .env("RIPTIDE_SHELL_LOADED", "1")
            .current_dir(cwd);
        cmd
    }

    /// Same, but without the shell integration marker.
    fn riptide_without_shell(&self, cwd: impl AsRef<Path>) -> Command {
        let mut cmd = self.riptide(cwd);
        cmd.env_remove("RIPTIDE_SHELL_LOADED");
        cmd
    }

    fn registry_contents(&self) -> String {
        fs::read_to_string(self.config.child("projects.json").path()).unwrap_or_default()
    }
}

// =============================================================================
// Missing configuration
// =============================================================================

#[test]
fn missing_config_warns_on_stdout_and_continues() {
    let fixture = Fixture::new();

    fixture
        .riptide(fixture.empty_dir())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "You don't have a configuration file for riptide yet",
        ))
        .stdout(predicate::str::contains("config-create-user"))
        .stderr(predicate::str::contains("Warning").not());
}

#[test]
fn missing_config_stays_quiet_for_config_create_user() {
    let fixture = Fixture::new();

    fixture
        .riptide(fixture.empty_dir())
        .arg("config-create-user")
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning:").not())
        .stdout(predicate::str::contains("Created"));

    fixture
        .config
        .child("config.toml")
        .assert(predicate::path::is_file());

    // Repoint the created file at the dummy engine so the second bootstrap
    // stays off docker; the refusal must leave the rewritten file alone.
    fixture
        .config
        .child("config.toml")
        .write_str("engine = \"dummy\"\nrepos = []\n")
        .expect("failed to rewrite config");

    fixture
        .riptide(fixture.empty_dir())
        .arg("config-create-user")
        .assert()
        .success()
        .stdout(predicate::str::contains("already have a configuration file"));

    fixture
        .config
        .child("config.toml")
        .assert(predicate::str::contains("engine = \"dummy\""));
}

// =============================================================================
// Resilient parsing
// =============================================================================

#[test]
fn completion_output_is_free_of_warnings() {
    let fixture = Fixture::new();

    fixture
        .riptide_without_shell(fixture.empty_dir())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning:").not())
        .stdout(predicate::str::contains("riptide"));
}

#[test]
fn shell_init_output_is_only_the_hook() {
    let fixture = Fixture::new();

    fixture
        .riptide_without_shell(fixture.empty_dir())
        .args(["shell-init", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export RIPTIDE_SHELL_LOADED=1"))
        .stdout(predicate::str::contains("add-zsh-hook"))
        .stdout(predicate::str::contains("Warning:").not());
}

#[test]
fn resilient_fatal_errors_stay_silent() {
    let fixture = Fixture::new();
    fixture.write_config_with_repo(Path::new("/no/such/repo"));

    // The refresh fails, so the invocation aborts; nothing may reach
    // either stream on the way down.
    fixture
        .riptide(fixture.empty_dir())
        .args(["-u", "completion", "bash"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

// =============================================================================
// Repository refresh
// =============================================================================

#[test]
fn update_reports_repository_progress() {
    let fixture = Fixture::new();
    let repo = fixture.blueprint_repo();
    fixture.write_config_with_repo(repo.path());

    fixture
        .riptide(fixture.empty_dir())
        .args(["-u", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updating repository"));
}

#[test]
fn resilient_mode_suppresses_repository_progress() {
    let fixture = Fixture::new();
    let repo = fixture.blueprint_repo();
    fixture.write_config_with_repo(repo.path());

    // The completion script is eval'd by the caller's shell, so the
    // refresh must not interleave progress lines into it.
    fixture
        .riptide(fixture.empty_dir())
        .args(["-u", "completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("riptide"))
        .stdout(predicate::str::contains("Updating repository").not())
        .stderr(predicate::str::is_empty());
}

// =============================================================================
// Shell integration marker
// =============================================================================

#[test]
fn missing_shell_integration_warns() {
    let fixture = Fixture::with_config("dummy");

    fixture
        .riptide_without_shell(fixture.empty_dir())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("shell integration not enabled"));
}

#[test]
fn shell_marker_suppresses_the_warning() {
    let fixture = Fixture::with_config("dummy");

    fixture
        .riptide(fixture.empty_dir())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning: riptide shell integration").not());
}

// =============================================================================
// Project discovery
// =============================================================================

#[test]
fn missing_project_warns_but_base_commands_run() {
    let fixture = Fixture::with_config("dummy");

    fixture
        .riptide(fixture.empty_dir())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No project found"));
}

#[test]
fn project_commands_fail_without_a_project() {
    let fixture = Fixture::with_config("dummy");

    fixture
        .riptide(fixture.empty_dir())
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a project"));
}

#[test]
fn resolved_project_is_registered_and_scripted() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir("alpha", "alpha");

    fixture
        .riptide(&project)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project: 'alpha'"));

    let registry = fixture.registry_contents();
    assert!(registry.contains("alpha"));
    assert!(registry.contains("registered_at"));

    project
        .child("_riptide/shell/aliases.bash")
        .assert(predicate::str::contains("alias hello='riptide cmd hello'"));
}

#[test]
fn explicit_project_flag_overrides_discovery() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir("alpha", "alpha");
    let project_file = project.child("riptide.toml");

    fixture
        .riptide(fixture.empty_dir())
        .arg("-p")
        .arg(project_file.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project: 'alpha'"));
}

#[test]
fn missing_explicit_project_file_is_fatal() {
    let fixture = Fixture::with_config("dummy");

    fixture
        .riptide(fixture.empty_dir())
        .args(["-p", "/no/such/riptide.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error parsing the system or project configuration.",
        ));
}

// =============================================================================
// Fatal configuration errors
// =============================================================================

#[test]
fn unresolvable_document_reference_suggests_update() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir_with_app_ref("alpha", "alpha", "missing-app");

    fixture
        .riptide(&project)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to load the project because a referenced document could not be found.",
        ))
        .stderr(predicate::str::contains("--update status"))
        .stdout(predicate::str::contains("referenced document").not());
}

#[test]
fn update_flag_suppresses_the_rerun_hint() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir_with_app_ref("alpha", "alpha", "missing-app");

    fixture
        .riptide(&project)
        .args(["-u", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("referenced document could not be found"))
        .stderr(predicate::str::contains("Make sure your repositories").not());
}

#[test]
fn quiet_errors_carry_a_summary_and_verbosity_hint() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir_with_app_ref("alpha", "alpha", "missing-app");

    fixture
        .riptide(&project)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains(">> referenced document 'missing-app'"))
        .stderr(predicate::str::contains("Use -v (before the subcommand)"))
        .stderr(predicate::str::contains("Caused by:").not());
}

#[test]
fn verbose_errors_show_the_cause_chain() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir_with_app_ref("alpha", "alpha", "missing-app");

    fixture
        .riptide(&project)
        .args(["-v", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Caused by:"))
        .stderr(predicate::str::contains("referenced document 'missing-app'"))
        .stderr(predicate::str::contains("Use -v").not());
}

#[test]
fn malformed_configuration_is_fatal() {
    let fixture = Fixture::new();
    fixture
        .config
        .child("config.toml")
        .write_str("engine = [broken")
        .expect("failed to write config");

    fixture
        .riptide(fixture.empty_dir())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error parsing the system or project configuration.",
        ));
}

// =============================================================================
// Engine loading
// =============================================================================

#[test]
fn unknown_engine_is_fatal_and_distinct() {
    let fixture = Fixture::with_config("frobnicator");

    fixture
        .riptide(fixture.empty_dir())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Unknown engine specified in configuration.",
        ))
        .stderr(predicate::str::contains("Connection to engine failed").not());
}

#[test]
fn unreachable_engine_fails_with_a_connection_error() {
    let fixture = Fixture::with_config("docker");
    let no_binaries = fixture.work.child("no-binaries");
    no_binaries
        .create_dir_all()
        .expect("failed to create empty dir");

    // With docker hidden from PATH, connecting fails whether or not a
    // daemon exists.
    fixture
        .riptide(fixture.empty_dir())
        .env("PATH", no_binaries.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection to engine failed."))
        .stderr(predicate::str::contains("Unknown engine").not());
}

// =============================================================================
// Project registry collisions
// =============================================================================

#[test]
fn moved_project_collides_until_renamed() {
    let fixture = Fixture::with_config("dummy");
    let first = fixture.project_dir("old-home", "alpha");
    let second = fixture.project_dir("new-home", "alpha");

    fixture.riptide(&first).arg("status").assert().success();

    fixture
        .riptide(&second)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"))
        .stderr(predicate::str::contains("--rename"));

    fixture
        .riptide(&second)
        .args(["--rename", "status"])
        .assert()
        .success();

    let registry = fixture.registry_contents();
    assert!(registry.contains("new-home"));
    assert!(!registry.contains("old-home"));
}

// =============================================================================
// Setup and lifecycle
// =============================================================================

#[test]
fn start_is_refused_before_setup() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir("alpha", "alpha");

    fixture
        .riptide(&project)
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not set up yet"));
}

#[test]
fn setup_then_start_succeeds() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir("alpha", "alpha");

    fixture
        .riptide(&project)
        .arg("setup")
        .assert()
        .success()
        .stdout(predicate::str::contains("is set up"));
    project
        .child("_riptide/setup_flag")
        .assert(predicate::path::is_file());

    fixture
        .riptide(&project)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Starting services for project 'alpha'",
        ))
        .stdout(predicate::str::contains("web: running"));
}

#[test]
fn config_dump_renders_the_loaded_configuration() {
    let fixture = Fixture::with_config("dummy");
    let project = fixture.project_dir("alpha", "alpha");

    fixture
        .riptide(&project)
        .arg("config-dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("engine = \"dummy\""))
        .stdout(predicate::str::contains("name = \"alpha\""));
}
