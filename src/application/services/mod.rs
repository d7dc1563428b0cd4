/// Application services shared by the use cases
///
/// These run the sandboxed installs and turn their artifacts into
/// measurements. They depend on ports only.
mod fan_out;
mod package_measurer;
mod package_snapshot;
mod sandbox_executor;

pub use fan_out::FanOutCoordinator;
pub use package_measurer::{PackageMeasurer, SandboxMeasurement};
pub use package_snapshot::{build_snapshot, capture_snapshot, fetch_downloads};
pub use sandbox_executor::{
    InstallTarget, LogSink, SandboxExecutor, SandboxHandle, SandboxOptions, SandboxState,
    DEFAULT_IMAGE, DEFAULT_INSTALL_TIMEOUT,
};
