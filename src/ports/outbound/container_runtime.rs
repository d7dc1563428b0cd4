use crate::shared::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncRead;

/// Combined stdout/stderr of a running container.
pub type LogStream = Box<dyn AsyncRead + Send + Unpin>;

/// A host directory mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

/// Everything needed to create one install container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub working_dir: String,
    pub mounts: Vec<BindMount>,
    pub tty: bool,
}

/// Runtime-assigned container identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a container stopped.
///
/// `fault` is an error the runtime reported on top of the exit status, for
/// example a command that could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    pub status_code: i64,
    pub fault: Option<String>,
}

/// ContainerRuntime port for running disposable install containers
///
/// This port abstracts the container engine (Docker or a compatible CLI).
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pulls the base image so later creates do not race to download it
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// Creates (but does not start) a container
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId>;

    async fn start(&self, id: &ContainerId) -> Result<()>;

    /// Follows the container output until it exits
    async fn stream_logs(&self, id: &ContainerId) -> Result<LogStream>;

    /// Blocks until the container is no longer running
    ///
    /// # Errors
    /// Returns an error only when waiting itself fails. A non-zero exit is
    /// reported through [`WaitOutcome::status_code`].
    async fn wait(&self, id: &ContainerId) -> Result<WaitOutcome>;

    /// Removes the container, killing it first if it still runs
    async fn remove(&self, id: &ContainerId) -> Result<()>;
}
