use crate::measurement::domain::{PackageManifest, ResolvedDependency};
use crate::ports::outbound::{
    BindMount, ContainerId, ContainerRuntime, ContainerSpec, LogStream, MANIFEST_NAME,
};
use crate::shared::error::SizeError;
use crate::shared::security::sanitize_file_name;
use crate::shared::Result;
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Node.js image the installs run in.
pub const DEFAULT_IMAGE: &str = "node:22";

/// Upper bound for one `npm install`.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

const SANDBOX_DIR_PREFIX: &str = "package_size_";
const CONTAINER_NAME_PREFIX: &str = "package-size-";
const SANDBOX_WORKDIR: &str = "/app";
const NPM_CACHE_TARGET: &str = "/root/.npm";

/// How long log forwarding may lag behind the container before it is cut off.
const LOG_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Where the install output of a container goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogSink {
    Stdout,
    #[default]
    Stderr,
    Discard,
}

/// Settings shared by every sandbox of a run.
#[derive(Debug, Clone)]
pub struct SandboxOptions {
    pub image: String,
    /// Host npm cache, mounted read-only. Must be absolute.
    pub npm_cache: Option<PathBuf>,
    /// Keep sandbox directories after measuring
    pub no_cleanup: bool,
    pub log_sink: LogSink,
    pub install_timeout: Option<Duration>,
    /// Parent of the sandbox directories, the system temp dir when `None`
    pub sandbox_root: Option<PathBuf>,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            npm_cache: None,
            no_cleanup: false,
            log_sink: LogSink::default(),
            install_timeout: Some(DEFAULT_INSTALL_TIMEOUT),
            sandbox_root: None,
        }
    }
}

/// What a sandbox installs.
#[derive(Debug, Clone)]
pub enum InstallTarget {
    /// `npm install name@version` into an empty directory
    Package(ResolvedDependency),
    /// Bare `npm install` against a manifest written into the sandbox
    Manifest {
        label: String,
        manifest: PackageManifest,
    },
}

impl InstallTarget {
    fn command(&self) -> Vec<String> {
        let mut command = vec![
            "npm".to_string(),
            "install".to_string(),
            "--loglevel".to_string(),
            "verbose".to_string(),
        ];
        if let InstallTarget::Package(dependency) = self {
            command.push(dependency.key());
        }
        command
    }
}

impl fmt::Display for InstallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallTarget::Package(dependency) => write!(f, "{}", dependency),
            InstallTarget::Manifest { label, .. } => write!(f, "{}", label),
        }
    }
}

/// Lifecycle of one install container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Created,
    Started,
    Running,
    Exited,
    Removed,
}

enum SandboxDir {
    Owned(TempDir),
    Retained(PathBuf),
}

impl SandboxDir {
    fn new(dir: TempDir, no_cleanup: bool) -> Self {
        if no_cleanup {
            SandboxDir::Retained(dir.keep())
        } else {
            SandboxDir::Owned(dir)
        }
    }

    fn path(&self) -> &Path {
        match self {
            SandboxDir::Owned(dir) => dir.path(),
            SandboxDir::Retained(path) => path,
        }
    }
}

/// The host directory of a finished install.
///
/// The directory is deleted when the handle is dropped, unless the
/// executor was configured not to clean up.
pub struct SandboxHandle {
    dir: SandboxDir,
    exit_status: i64,
}

impl SandboxHandle {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Exit status of `npm install`. Non-zero does not mean nothing was installed.
    pub fn exit_status(&self) -> i64 {
        self.exit_status
    }

    pub fn is_retained(&self) -> bool {
        matches!(self.dir, SandboxDir::Retained(_))
    }
}

/// SandboxExecutor runs one `npm install` per call in a throwaway container
///
/// Every call gets its own directory, bind-mounted as the container's working
/// directory, and its own uniquely named container. Calls are independent and
/// may run concurrently.
///
/// # Type Parameters
/// * `C` - ContainerRuntime implementation
pub struct SandboxExecutor<C> {
    runtime: Arc<C>,
    options: SandboxOptions,
}

impl<C: ContainerRuntime> SandboxExecutor<C> {
    pub fn new(runtime: Arc<C>, options: SandboxOptions) -> Self {
        Self { runtime, options }
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    /// Pulls the base image. Run once before the first install.
    pub async fn prepare_image(&self) -> Result<()> {
        self.runtime
            .pull_image(&self.options.image)
            .await
            .with_context(|| format!("Failed to pull image {}", self.options.image))
    }

    /// Installs `target` in a fresh sandbox and waits for npm to finish.
    ///
    /// A non-zero npm exit status is only logged; callers judge the install
    /// by its artifacts. The container is removed whatever the outcome.
    ///
    /// # Errors
    /// - [`SizeError::RelativeCacheMount`] before anything is created
    /// - [`SizeError::SandboxCreation`] when the directory, manifest or container cannot be created
    /// - [`SizeError::ContainerFailure`] when the container cannot be started or waited on,
    ///   or the runtime reports a fault
    /// - [`SizeError::InstallTimeout`] when npm runs longer than the configured timeout
    pub async fn install(&self, target: &InstallTarget) -> Result<SandboxHandle> {
        let label = target.to_string();
        let cache_mount = self.cache_mount()?;

        let dir = SandboxDir::new(self.allocate_dir(target, &label)?, self.options.no_cleanup);
        if let SandboxDir::Retained(path) = &dir {
            tracing::info!(dir = %path.display(), package = %label, "Keeping sandbox directory");
        }
        if let InstallTarget::Manifest { manifest, .. } = target {
            self.write_manifest(dir.path(), manifest, &label).await?;
        }

        let mut mounts = vec![BindMount {
            source: dir.path().to_path_buf(),
            target: SANDBOX_WORKDIR.to_string(),
            read_only: false,
        }];
        mounts.extend(cache_mount);

        let spec = ContainerSpec {
            name: format!("{}{}", CONTAINER_NAME_PREFIX, Uuid::new_v4().simple()),
            image: self.options.image.clone(),
            command: target.command(),
            working_dir: SANDBOX_WORKDIR.to_string(),
            mounts,
            tty: true,
        };

        let id = self
            .runtime
            .create(&spec)
            .await
            .map_err(|e| SizeError::SandboxCreation {
                target: label.clone(),
                details: format!("{:#}", e),
            })?;
        tracing::debug!(container = %id, package = %label, state = ?SandboxState::Created, "Sandbox container created");

        let started = self.start(&id, &label).await;
        let log_task = if started.is_ok() {
            self.forward_logs(&id).await
        } else {
            None
        };
        let outcome = match started {
            Ok(()) => self.wait(&id, &label).await,
            Err(e) => Err(e),
        };

        self.remove(&id).await;
        if let Some(task) = log_task {
            drain_logs(task).await;
        }

        match outcome {
            Ok(exit_status) => Ok(SandboxHandle { dir, exit_status }),
            Err(e) => {
                if let SandboxDir::Retained(path) = &dir {
                    tracing::warn!(
                        dir = %path.display(),
                        "Install of {} failed, sandbox directory kept",
                        label
                    );
                }
                Err(e)
            }
        }
    }

    fn cache_mount(&self) -> Result<Option<BindMount>> {
        let Some(path) = &self.options.npm_cache else {
            return Ok(None);
        };
        if !path.is_absolute() {
            return Err(SizeError::RelativeCacheMount { path: path.clone() }.into());
        }
        Ok(Some(BindMount {
            source: path.clone(),
            target: NPM_CACHE_TARGET.to_string(),
            read_only: true,
        }))
    }

    fn allocate_dir(&self, target: &InstallTarget, label: &str) -> Result<TempDir> {
        let identity = match target {
            InstallTarget::Package(dependency) => dependency.key(),
            InstallTarget::Manifest {
                label: manifest_label,
                ..
            } => manifest_label.clone(),
        };
        let prefix = format!("{}{}_", SANDBOX_DIR_PREFIX, sanitize_file_name(&identity));

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match &self.options.sandbox_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };

        dir.map_err(|e| {
            SizeError::SandboxCreation {
                target: label.to_string(),
                details: format!("could not create sandbox directory: {}", e),
            }
            .into()
        })
    }

    async fn write_manifest(
        &self,
        dir: &Path,
        manifest: &PackageManifest,
        label: &str,
    ) -> Result<()> {
        let creation_error = |details: String| SizeError::SandboxCreation {
            target: label.to_string(),
            details,
        };

        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| creation_error(format!("could not serialize {}: {}", MANIFEST_NAME, e)))?;
        tokio::fs::write(dir.join(MANIFEST_NAME), content)
            .await
            .map_err(|e| creation_error(format!("could not write {}: {}", MANIFEST_NAME, e)))?;
        Ok(())
    }

    async fn start(&self, id: &ContainerId, label: &str) -> Result<()> {
        self.runtime
            .start(id)
            .await
            .map_err(|e| container_failure(id, label, format!("{:#}", e)))?;
        tracing::debug!(container = %id, state = ?SandboxState::Started, "Sandbox container started");
        Ok(())
    }

    async fn forward_logs(&self, id: &ContainerId) -> Option<JoinHandle<()>> {
        let sink = self.options.log_sink;
        if sink == LogSink::Discard {
            return None;
        }

        let stream = match self.runtime.stream_logs(id).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(container = %id, "Failed to attach to install output: {:#}", e);
                return None;
            }
        };
        tracing::debug!(container = %id, state = ?SandboxState::Running, "Streaming install output");

        let container = id.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = copy_logs(stream, sink).await {
                tracing::error!(container = %container, "Failed to forward install output: {}", e);
            }
        }))
    }

    async fn wait(&self, id: &ContainerId, label: &str) -> Result<i64> {
        let waiting = self.runtime.wait(id);
        let outcome = match self.options.install_timeout {
            Some(limit) => tokio::time::timeout(limit, waiting).await.map_err(|_| {
                SizeError::InstallTimeout {
                    target: label.to_string(),
                    seconds: limit.as_secs(),
                }
            })?,
            None => waiting.await,
        }
        .map_err(|e| container_failure(id, label, format!("{:#}", e)))?;

        tracing::debug!(
            container = %id,
            status = outcome.status_code,
            state = ?SandboxState::Exited,
            "Sandbox container exited"
        );

        if let Some(fault) = outcome.fault {
            return Err(container_failure(id, label, fault).into());
        }
        if outcome.status_code != 0 {
            tracing::warn!(
                container = %id,
                status = outcome.status_code,
                "npm install of {} exited with a non-zero status, measuring what was installed",
                label
            );
        }
        Ok(outcome.status_code)
    }

    async fn remove(&self, id: &ContainerId) {
        match self.runtime.remove(id).await {
            Ok(()) => {
                tracing::debug!(container = %id, state = ?SandboxState::Removed, "Sandbox container removed")
            }
            Err(e) => tracing::warn!(container = %id, "Failed to remove sandbox container: {:#}", e),
        }
    }
}

fn container_failure(id: &ContainerId, label: &str, details: String) -> SizeError {
    SizeError::ContainerFailure {
        container: id.to_string(),
        target: label.to_string(),
        details,
    }
}

async fn copy_logs(mut stream: LogStream, sink: LogSink) -> std::io::Result<u64> {
    match sink {
        LogSink::Stdout => tokio::io::copy(&mut stream, &mut tokio::io::stdout()).await,
        LogSink::Stderr => tokio::io::copy(&mut stream, &mut tokio::io::stderr()).await,
        LogSink::Discard => tokio::io::copy(&mut stream, &mut tokio::io::sink()).await,
    }
}

async fn drain_logs(mut task: JoinHandle<()>) {
    if tokio::time::timeout(LOG_DRAIN_GRACE, &mut task).await.is_err() {
        tracing::debug!("Install output still open after the container was removed, detaching");
        task.abort();
    }
}
