use crate::measurement::domain::Lockfile;
use crate::shared::Result;
use std::path::Path;

/// Directory npm installs packages into, relative to the sandbox root.
pub const INSTALL_DIR: &str = "node_modules";

/// Lockfile npm writes at the sandbox root.
pub const LOCKFILE_NAME: &str = "package-lock.json";

/// Manifest read by a bare `npm install`.
pub const MANIFEST_NAME: &str = "package.json";

/// SandboxArtifacts port for reading what an install left behind
///
/// Methods block on filesystem I/O; async callers run them on a blocking
/// thread.
pub trait SandboxArtifacts: Send + Sync {
    /// Sums the byte size of every file below the sandbox's install directory
    ///
    /// # Errors
    /// Returns an error if the directory cannot be walked
    fn installed_size(&self, sandbox_dir: &Path) -> Result<u64>;

    /// Reads and parses the sandbox's lockfile
    ///
    /// # Errors
    /// Returns an error if the file is missing, unreadable, malformed or not
    /// lockfile version 3
    fn read_lockfile(&self, sandbox_dir: &Path) -> Result<Lockfile>;
}
