use crate::ports::outbound::{ContainerId, ContainerRuntime, ContainerSpec, LogStream, WaitOutcome};
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_PROGRAM: &str = "docker";

/// DockerCli adapter driving containers through the `docker` command line
///
/// Any CLI with Docker's `create`/`start`/`logs`/`wait`/`inspect`/`rm`
/// syntax works, e.g. `podman`.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs one CLI invocation and returns its trimmed stdout
    async fn run(&self, args: &[String]) -> Result<String> {
        tracing::trace!(program = %self.program, ?args, "Running container CLI");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| {
                format!(
                    "Failed to run `{}`, is it installed and on PATH?",
                    self.program
                )
            })?;

        if !output.status.success() {
            anyhow::bail!(
                "`{} {}` failed ({}): {}",
                self.program,
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn pull_image(&self, image: &str) -> Result<()> {
        let output = self
            .run(&["pull".to_string(), image.to_string()])
            .await
            .with_context(|| format!("Failed to pull base image {}", image))?;
        tracing::debug!(image, output = %output, "Pulled base image");
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let id = self.run(&create_args(spec)).await?;
        if id.is_empty() {
            anyhow::bail!("`{} create` printed no container id", self.program);
        }
        Ok(ContainerId(id))
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        self.run(&["start".to_string(), id.0.clone()]).await?;
        Ok(())
    }

    async fn stream_logs(&self, id: &ContainerId) -> Result<LogStream> {
        let mut child = Command::new(&self.program)
            .args(["logs", "--follow", id.0.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to follow logs of container {}", id))?;

        let stdout = child
            .stdout
            .take()
            .context("Container log process has no stdout")?;

        // Reap the follower once the container stops writing.
        let container = id.clone();
        tokio::spawn(async move {
            if let Err(e) = child.wait().await {
                tracing::debug!(%container, error = %e, "Log follower did not exit cleanly");
            }
        });

        Ok(Box::new(stdout))
    }

    async fn wait(&self, id: &ContainerId) -> Result<WaitOutcome> {
        let status = self.run(&["wait".to_string(), id.0.clone()]).await?;
        let status_code = parse_status_code(&status)?;

        let fault = self
            .run(&[
                "inspect".to_string(),
                "--format".to_string(),
                "{{.State.Error}}".to_string(),
                id.0.clone(),
            ])
            .await?;

        Ok(WaitOutcome {
            status_code,
            fault: (!fault.is_empty()).then_some(fault),
        })
    }

    async fn remove(&self, id: &ContainerId) -> Result<()> {
        self.run(&["rm".to_string(), "--force".to_string(), id.0.clone()])
            .await?;
        Ok(())
    }
}

/// Arguments for `docker create`, image and command last.
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["create".to_string()];

    if spec.tty {
        args.push("--tty".to_string());
    }
    args.push("--workdir".to_string());
    args.push(spec.working_dir.clone());
    args.push("--name".to_string());
    args.push(spec.name.clone());

    for mount in &spec.mounts {
        let mut value = format!(
            "type=bind,source={},target={}",
            mount.source.display(),
            mount.target
        );
        if mount.read_only {
            value.push_str(",readonly");
        }
        args.push("--mount".to_string());
        args.push(value);
    }

    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

/// `docker wait` prints the exit code; some engines print one line per id.
fn parse_status_code(output: &str) -> Result<i64> {
    let line = output.lines().last().unwrap_or_default().trim();
    line.parse::<i64>()
        .with_context(|| format!("Unexpected exit status from container wait: {:?}", output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::BindMount;
    use std::path::PathBuf;

    fn spec() -> ContainerSpec {
        ContainerSpec {
            name: "package-size-abc".to_string(),
            image: "node:22".to_string(),
            command: vec![
                "npm".to_string(),
                "install".to_string(),
                "left-pad@1.3.0".to_string(),
            ],
            working_dir: "/app".to_string(),
            mounts: vec![
                BindMount {
                    source: PathBuf::from("/tmp/package_size_left-pad@1.3.0_x1"),
                    target: "/app".to_string(),
                    read_only: false,
                },
                BindMount {
                    source: PathBuf::from("/home/me/.npm"),
                    target: "/root/.npm".to_string(),
                    read_only: true,
                },
            ],
            tty: true,
        }
    }

    #[test]
    fn test_create_args() {
        assert_eq!(
            create_args(&spec()),
            vec![
                "create",
                "--tty",
                "--workdir",
                "/app",
                "--name",
                "package-size-abc",
                "--mount",
                "type=bind,source=/tmp/package_size_left-pad@1.3.0_x1,target=/app",
                "--mount",
                "type=bind,source=/home/me/.npm,target=/root/.npm,readonly",
                "node:22",
                "npm",
                "install",
                "left-pad@1.3.0",
            ]
        );
    }

    #[test]
    fn test_create_args_without_tty() {
        let mut spec = spec();
        spec.tty = false;
        spec.mounts.clear();
        let args = create_args(&spec);
        assert!(!args.contains(&"--tty".to_string()));
        assert!(!args.contains(&"--mount".to_string()));
    }

    #[test]
    fn test_parse_status_code() {
        assert_eq!(parse_status_code("0\n").unwrap(), 0);
        assert_eq!(parse_status_code("137").unwrap(), 137);
        assert!(parse_status_code("").is_err());
        assert!(parse_status_code("Error: no such container").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let cli = DockerCli::with_program("definitely-not-a-container-cli");
        let err = cli
            .start(&ContainerId("abc".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is it installed"));
    }
}
