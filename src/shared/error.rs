use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes let scripts tell an input problem apart from a failed
/// measurement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - the report was produced
    Success = 0,
    /// Invalid command-line arguments, or an input the user should correct
    InvalidArguments = 2,
    /// Application error (registry, sandbox, lockfile, file I/O, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Picks the exit code for an error that reached the process boundary.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if is_retryable(err) {
            ExitCode::InvalidArguments
        } else {
            ExitCode::ApplicationError
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Errors raised while resolving, installing and measuring packages.
///
/// Input and resolution errors are recoverable: an interactive caller should
/// ask for a corrected specifier. Everything else ends the run.
#[derive(Debug, Error)]
pub enum SizeError {
    #[error("Invalid package specifier: \"{input}\"\nReason: {reason}\n\n💡 Hint: Use \"name\", \"name@range\" or \"name range\"")]
    InvalidSpecifier { input: String, reason: String },

    #[error("Invalid version constraint \"{constraint}\" for {name}\nDetails: {details}")]
    InvalidConstraint {
        name: String,
        constraint: String,
        details: String,
    },

    #[error("No version of {name} satisfies \"{constraint}\"")]
    NoMatchingVersion { name: String, constraint: String },

    #[error("Package {name} has no \"latest\" dist-tag pointing at a published version")]
    NoLatestVersion { name: String },

    #[error("Package not found in registry: {name}\n\n💡 Hint: Check the spelling, scoped packages look like @scope/name")]
    PackageNotFound { name: String },

    #[error("Registry request failed for {name}\nDetails: {details}\n\n💡 Hint: Check your network connection and the configured registry URL")]
    Registry { name: String, details: String },

    #[error("NPM cache mount must be an absolute path: {path}")]
    RelativeCacheMount { path: PathBuf },

    #[error("Failed to create sandbox for {target}\nDetails: {details}")]
    SandboxCreation { target: String, details: String },

    #[error("Container {container} failed while installing {target}\nDetails: {details}")]
    ContainerFailure {
        container: String,
        target: String,
        details: String,
    },

    #[error("Install of {target} did not finish within {seconds}s")]
    InstallTimeout { target: String, seconds: u64 },

    #[error("Unsupported lockfile version: {version} (only lockfileVersion 3 is supported)")]
    UnsupportedLockfileVersion { version: i64 },

    #[error("Failed to parse lockfile: {path}\nDetails: {details}")]
    LockfileParse { path: PathBuf, details: String },

    #[error("Failed to read sandbox artifacts: {path}\nDetails: {details}")]
    ArtifactRead { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWrite { path: PathBuf, details: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SizeError {
    /// Whether the error asks for corrected input rather than ending the run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SizeError::InvalidSpecifier { .. }
                | SizeError::InvalidConstraint { .. }
                | SizeError::NoMatchingVersion { .. }
                | SizeError::NoLatestVersion { .. }
        )
    }
}

/// Returns true when `err` (or anything it wraps) is a retryable [`SizeError`].
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SizeError>())
        .any(SizeError::is_retryable)
}
