//! engine::docker
//!
//! Engine backend driving the local `docker` CLI.
//!
//! # Container naming
//!
//! Every container this backend creates is named
//! `riptide__<project>__<service>` and labelled with the project name, so
//! lifecycle operations can never touch containers riptide did not create.
//!
//! # Connection probe
//!
//! [`DockerEngine::connect`] runs `docker version` once, synchronously,
//! while the engine is being loaded. A daemon that is down fails the whole
//! bootstrap rather than the first command that happens to need it.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{select_services, Engine, EngineError, EngineLoadError, ServiceStatus};
use crate::config::{ProjectConfig, ServiceConfig};

pub const ENGINE_NAME: &str = "docker";

/// Label attached to every container riptide creates.
const PROJECT_LABEL: &str = "riptide.project";

/// In-container path where database dumps are staged for import.
const IMPORT_TARGET: &str = "/tmp/riptide-import.dump";

/// Engine that shells out to the `docker` CLI.
pub struct DockerEngine;

impl DockerEngine {
    /// Probe the docker daemon and build the engine.
    ///
    /// # Errors
    ///
    /// [`EngineLoadError::Connection`] when the daemon does not answer.
    pub fn connect() -> Result<Self, EngineLoadError> {
        let probe = std::process::Command::new("docker")
            .args(["version", "--format", "{{.Server.Version}}"])
            .output();

        match probe {
            Ok(out) if out.status.success() => Ok(DockerEngine),
            Ok(out) => Err(EngineLoadError::Connection {
                engine: ENGINE_NAME.to_string(),
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }),
            Err(err) => Err(EngineLoadError::Connection {
                engine: ENGINE_NAME.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// Name of a service's container.
fn container_name(project: &ProjectConfig, service: &str) -> String {
    format!("riptide__{}__{}", project.name, service)
}

/// Run a docker subcommand, capturing output. Non-zero exit becomes
/// [`EngineError::CommandFailed`] carrying the operation name and stderr.
async fn run_docker<I, S>(operation: &str, args: I) -> Result<std::process::Output, EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new("docker").args(args).output().await?;
    if !output.status.success() {
        return Err(EngineError::CommandFailed {
            operation: operation.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Whether a container exists, and if so whether it is running.
async fn inspect_running(container: &str) -> Result<Option<bool>, EngineError> {
    let output = Command::new("docker")
        .args(["inspect", "--format", "{{.State.Running}}", container])
        .output()
        .await?;
    if !output.status.success() {
        // Docker reports unknown containers as an inspect failure.
        return Ok(None);
    }
    Ok(Some(
        String::from_utf8_lossy(&output.stdout).trim() == "true",
    ))
}

async fn create_and_start(
    project: &ProjectConfig,
    service: &str,
    config: &ServiceConfig,
) -> Result<(), EngineError> {
    let mut args: Vec<String> = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        container_name(project, service),
        "--label".to_string(),
        format!("{}={}", PROJECT_LABEL, project.name),
        config.image.clone(),
    ];
    if let Some(command) = &config.command {
        args.push("sh".to_string());
        args.push("-c".to_string());
        args.push(command.clone());
    }
    run_docker("starting service", &args).await?;
    Ok(())
}

#[async_trait]
impl Engine for DockerEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn start(&self, project: &ProjectConfig, services: &[String]) -> Result<(), EngineError> {
        for service in select_services(project, services)? {
            let Some(config) = project.app.services.get(&service) else {
                continue;
            };
            let container = container_name(project, &service);
            match inspect_running(&container).await? {
                Some(true) => {}
                Some(false) => {
                    run_docker("starting service", ["start", container.as_str()]).await?;
                }
                None => create_and_start(project, &service, config).await?,
            }
        }
        Ok(())
    }

    async fn stop(&self, project: &ProjectConfig, services: &[String]) -> Result<(), EngineError> {
        for service in select_services(project, services)? {
            let container = container_name(project, &service);
            if let Some(true) = inspect_running(&container).await? {
                run_docker("stopping service", ["stop", container.as_str()]).await?;
            }
        }
        Ok(())
    }

    async fn status(
        &self,
        project: &ProjectConfig,
    ) -> Result<BTreeMap<String, ServiceStatus>, EngineError> {
        let mut statuses = BTreeMap::new();
        for service in project.app.services.keys() {
            let running = inspect_running(&container_name(project, service)).await?;
            let status = match running {
                Some(true) => ServiceStatus::Running,
                _ => ServiceStatus::Stopped,
            };
            statuses.insert(service.clone(), status);
        }
        Ok(statuses)
    }

    async fn exec(
        &self,
        project: &ProjectConfig,
        service: &str,
        argv: &[String],
    ) -> Result<i32, EngineError> {
        if !project.app.services.contains_key(service) {
            return Err(EngineError::UnknownService(service.to_string()));
        }
        let container = container_name(project, service);
        let status = Command::new("docker")
            .args(["exec", "-i", container.as_str()])
            .args(argv)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.code().unwrap_or(1))
    }

    async fn import_db(
        &self,
        project: &ProjectConfig,
        service: &str,
        dump: &Path,
    ) -> Result<(), EngineError> {
        let config = project
            .app
            .services
            .get(service)
            .ok_or_else(|| EngineError::UnknownService(service.to_string()))?;
        let import_command = config.import_command.as_ref().ok_or_else(|| {
            EngineError::Unsupported {
                service: service.to_string(),
                operation: "database import".to_string(),
            }
        })?;

        let container = container_name(project, service);
        run_docker(
            "staging the dump",
            [
                "cp".to_string(),
                dump.display().to_string(),
                format!("{container}:{IMPORT_TARGET}"),
            ],
        )
        .await?;
        run_docker(
            "importing the dump",
            [
                "exec".to_string(),
                container,
                "sh".to_string(),
                "-c".to_string(),
                import_command.clone(),
            ],
        )
        .await?;
        Ok(())
    }
}
