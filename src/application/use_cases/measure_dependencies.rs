use super::resolve_dependencies::ResolveDependenciesUseCase;
use crate::application::dto::BatchReport;
use crate::application::services::{capture_snapshot, FanOutCoordinator, PackageMeasurer};
use crate::measurement::domain::ResolvedDependency;
use crate::measurement::services::DiffAggregator;
use crate::ports::outbound::{ContainerRuntime, PackageRegistry, ProgressReporter, SandboxArtifacts};
use crate::shared::error::SizeError;
use crate::shared::Result;
use std::sync::Arc;

/// MeasureDependenciesUseCase - Breakdown of a package by direct dependency
///
/// Every direct dependency is installed on its own next to the package
/// itself, and each one is reported with its share of the package.
pub struct MeasureDependenciesUseCase<R, C, A, P> {
    registry: Arc<R>,
    measurer: PackageMeasurer<C, A>,
    progress_reporter: P,
    resolver_workers: usize,
}

impl<R, C, A, P> MeasureDependenciesUseCase<R, C, A, P>
where
    R: PackageRegistry + 'static,
    C: ContainerRuntime,
    A: SandboxArtifacts + 'static,
    P: ProgressReporter,
{
    pub fn new(
        registry: Arc<R>,
        measurer: PackageMeasurer<C, A>,
        progress_reporter: P,
        resolver_workers: usize,
    ) -> Self {
        Self {
            registry,
            measurer,
            progress_reporter,
            resolver_workers,
        }
    }

    pub async fn execute(
        &self,
        package: &ResolvedDependency,
        include_dev: bool,
    ) -> Result<BatchReport> {
        let catalog = self.registry.get_catalog(&package.name).await?;
        let manifest = &catalog
            .get(&package.version)
            .ok_or_else(|| SizeError::NoMatchingVersion {
                name: package.name.clone(),
                constraint: package.version.to_string(),
            })?
            .manifest;

        self.progress_reporter
            .report(&format!("🔍 Resolving the dependencies of {}...", package));
        let resolver =
            ResolveDependenciesUseCase::new(Arc::clone(&self.registry), self.resolver_workers);
        let (resolved, unresolved) = resolver.resolve_manifest(manifest, include_dev).await;
        for failure in &unresolved {
            self.progress_reporter.report_error(&format!(
                "⚠️  Skipping {}@{}: {}",
                failure.name, failure.constraint, failure.reason
            ));
        }

        self.progress_reporter.report(&format!(
            "📦 Installing {} and {} dependencies in sandboxes...",
            package,
            resolved.len()
        ));
        let coordinator = FanOutCoordinator::new(
            self.registry.as_ref(),
            &self.measurer,
            &self.progress_reporter,
        );
        let (snapshot, measured) = tokio::join!(
            capture_snapshot(self.registry.as_ref(), &self.measurer, package),
            coordinator.measure_all(&resolved)
        );
        let snapshot = snapshot?;
        let measured = measured?;

        let dependencies: Vec<_> = resolved
            .iter()
            .filter_map(|dependency| {
                measured.get(&dependency.key()).map(|measurement| {
                    DiffAggregator::share(
                        dependency,
                        measurement,
                        &snapshot.measurement,
                        snapshot.measurement.installed_size_bytes,
                    )
                })
            })
            .collect();
        let total_dependency_size_bytes = dependencies.iter().map(|d| d.installed_size_bytes).sum();

        self.progress_reporter.report_completion(&format!(
            "✅ Measured {} dependencies of {}",
            dependencies.len(),
            package
        ));

        Ok(BatchReport {
            package: snapshot,
            dependencies,
            unresolved,
            total_dependency_size_bytes,
        })
    }
}
