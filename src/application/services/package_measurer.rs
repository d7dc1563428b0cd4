use super::sandbox_executor::{InstallTarget, SandboxExecutor};
use crate::measurement::domain::Lockfile;
use crate::ports::outbound::{ContainerRuntime, SandboxArtifacts};
use crate::shared::Result;
use anyhow::Context;
use std::sync::Arc;

/// Artifacts of one sandboxed install.
///
/// The lockfile is kept as a `Result`: whether a missing or unsupported
/// lockfile is fatal depends on what the install was for.
#[derive(Debug)]
pub struct SandboxMeasurement {
    pub installed_size_bytes: u64,
    pub lockfile: Result<Lockfile>,
    pub exit_status: i64,
}

/// PackageMeasurer installs a target and reads back what npm left behind
///
/// # Type Parameters
/// * `C` - ContainerRuntime implementation
/// * `A` - SandboxArtifacts implementation
pub struct PackageMeasurer<C, A> {
    executor: SandboxExecutor<C>,
    artifacts: Arc<A>,
}

impl<C, A> PackageMeasurer<C, A>
where
    C: ContainerRuntime,
    A: SandboxArtifacts + 'static,
{
    pub fn new(executor: SandboxExecutor<C>, artifacts: A) -> Self {
        Self {
            executor,
            artifacts: Arc::new(artifacts),
        }
    }

    pub fn executor(&self) -> &SandboxExecutor<C> {
        &self.executor
    }

    /// Installs `target` and measures the result.
    ///
    /// The directory walk runs on the blocking pool. The sandbox directory
    /// is released (and deleted, unless retained) before returning.
    ///
    /// # Errors
    /// Sandbox errors, and failures to walk the install directory. Lockfile
    /// errors are returned inside [`SandboxMeasurement::lockfile`].
    pub async fn measure(&self, target: &InstallTarget) -> Result<SandboxMeasurement> {
        let sandbox = self.executor.install(target).await?;

        let artifacts = Arc::clone(&self.artifacts);
        let dir = sandbox.path().to_path_buf();
        let (installed_size, lockfile) = tokio::task::spawn_blocking(move || {
            (artifacts.installed_size(&dir), artifacts.read_lockfile(&dir))
        })
        .await
        .with_context(|| format!("Measuring the install of {} was aborted", target))?;

        let installed_size_bytes = installed_size?;
        tracing::debug!(package = %target, bytes = installed_size_bytes, "Measured sandbox");

        Ok(SandboxMeasurement {
            installed_size_bytes,
            lockfile,
            exit_status: sandbox.exit_status(),
        })
    }
}
