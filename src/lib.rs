//! package-size - installed footprint of npm packages
//!
//! This library resolves npm package specifiers against the registry,
//! installs them in disposable Docker containers, and measures what the
//! install left on disk: the size of `node_modules` and the number of
//! packages in the lockfile. On top of single measurements it estimates
//! the effect of adding or removing dependencies, compares two versions of
//! a package, and breaks a package down by direct dependency.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`measurement`): Specifiers, catalogs, lockfiles, version resolution and diff statistics
//! - **Application Layer** (`application`): Use cases, sandbox orchestration and report DTOs
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Registry client, Docker CLI, filesystem and formatters
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use package_size::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let registry = Arc::new(CachingRegistry::new(NpmRegistryClient::new(
//!     DEFAULT_REGISTRY_URL,
//!     DEFAULT_API_URL,
//!     DEFAULT_REGISTRY_TIMEOUT,
//! )?));
//! let executor = SandboxExecutor::new(Arc::new(DockerCli::new()), SandboxOptions::default());
//! executor.prepare_image().await?;
//! let measurer = PackageMeasurer::new(executor, FileSystemArtifacts::new());
//!
//! let resolver = ResolveDependenciesUseCase::new(Arc::clone(&registry), 2);
//! let (package, _) = resolver.resolve_specifier("express@^4").await?;
//!
//! let use_case = EstimateDependencyChangeUseCase::new(
//!     registry,
//!     measurer,
//!     StderrProgressReporter::new(),
//! );
//! let snapshot = use_case.measure_package(&package).await?;
//!
//! let output = TextFormatter::new().format(&Report::Measure(snapshot))?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod measurement;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::container::DockerCli;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemArtifacts, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{JsonFormatter, TextFormatter};
    pub use crate::adapters::outbound::network::{
        CachingRegistry, NpmRegistryClient, DEFAULT_API_URL, DEFAULT_REGISTRY_TIMEOUT,
        DEFAULT_REGISTRY_URL,
    };
    pub use crate::application::dto::{ChangeRequest, OutputFormat, Report};
    pub use crate::application::services::{
        InstallTarget, PackageMeasurer, SandboxExecutor, SandboxOptions,
    };
    pub use crate::application::use_cases::{
        CompareVersionsUseCase, EstimateDependencyChangeUseCase, MeasureDependenciesUseCase,
        ResolveDependenciesUseCase,
    };
    pub use crate::measurement::domain::{
        DependencySpecifier, Lockfile, MeasurementResult, PackageManifest, ResolvedDependency,
        VersionCatalog,
    };
    pub use crate::measurement::services::{DiffAggregator, VersionResolver};
    pub use crate::ports::outbound::{
        ContainerRuntime, OutputPresenter, PackageRegistry, ProgressReporter, ReportFormatter,
        SandboxArtifacts,
    };
    pub use crate::shared::Result;
}
