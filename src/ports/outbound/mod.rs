/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (registry, container engine,
/// file system, console).
pub mod container_runtime;
pub mod output_presenter;
pub mod package_registry;
pub mod progress_reporter;
pub mod report_formatter;
pub mod sandbox_artifacts;

pub use container_runtime::{
    BindMount, ContainerId, ContainerRuntime, ContainerSpec, LogStream, WaitOutcome,
};
pub use output_presenter::OutputPresenter;
pub use package_registry::PackageRegistry;
pub use progress_reporter::ProgressReporter;
pub use report_formatter::ReportFormatter;
pub use sandbox_artifacts::{SandboxArtifacts, INSTALL_DIR, LOCKFILE_NAME, MANIFEST_NAME};
