use crate::application::dto::VersionComparisonReport;
use crate::application::services::{build_snapshot, fetch_downloads, InstallTarget, PackageMeasurer};
use crate::measurement::domain::{DependencySpecifier, ResolvedDependency, VersionCatalog};
use crate::measurement::services::{DiffAggregator, VersionResolver};
use crate::ports::outbound::{ContainerRuntime, PackageRegistry, ProgressReporter, SandboxArtifacts};
use crate::shared::Result;
use std::sync::Arc;

/// CompareVersionsUseCase - Installed size of two versions of one package
///
/// Both versions are installed concurrently. Traffic figures use the weekly
/// downloads of the old version for both sides.
pub struct CompareVersionsUseCase<R, C, A, P> {
    registry: Arc<R>,
    measurer: PackageMeasurer<C, A>,
    progress_reporter: P,
}

impl<R, C, A, P> CompareVersionsUseCase<R, C, A, P>
where
    R: PackageRegistry,
    C: ContainerRuntime,
    A: SandboxArtifacts + 'static,
    P: ProgressReporter,
{
    pub fn new(registry: Arc<R>, measurer: PackageMeasurer<C, A>, progress_reporter: P) -> Self {
        Self {
            registry,
            measurer,
            progress_reporter,
        }
    }

    /// Compares the versions `old` and `new` of package `name`.
    ///
    /// # Errors
    /// Resolution errors for either constraint, and any install or lockfile
    /// error of either version.
    pub async fn execute(
        &self,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<VersionComparisonReport> {
        let catalog = self.registry.get_catalog(name).await?;
        let old_version = resolve(name, old, &catalog)?;
        let new_version = resolve(name, new, &catalog)?;

        self.progress_reporter.report(&format!(
            "📦 Installing {} and {} in sandboxes...",
            old_version, new_version
        ));

        let old_target = InstallTarget::Package(old_version.clone());
        let new_target = InstallTarget::Package(new_version.clone());
        let (downloads, old_measured, new_measured) = tokio::join!(
            fetch_downloads(self.registry.as_ref(), name),
            self.measurer.measure(&old_target),
            self.measurer.measure(&new_target)
        );

        let old_snapshot =
            build_snapshot(&catalog, &old_version, old_measured?, downloads.as_ref())?;
        let new_snapshot =
            build_snapshot(&catalog, &new_version, new_measured?, downloads.as_ref())?;

        let difference = DiffAggregator::size_difference(
            old_snapshot.measurement.installed_size_bytes,
            new_snapshot.measurement.installed_size_bytes,
            old_snapshot.measurement.downloads_last_week,
        );
        let subdependency_change = old_snapshot
            .measurement
            .subdependency_count
            .zip(new_snapshot.measurement.subdependency_count)
            .map(|(old, new)| new as i64 - old as i64);

        self.progress_reporter.report_completion(&format!(
            "✅ Compared {} with {}",
            old_version, new_version
        ));

        Ok(VersionComparisonReport {
            old: old_snapshot,
            new: new_snapshot,
            difference,
            subdependency_change,
        })
    }
}

fn resolve(name: &str, constraint: &str, catalog: &VersionCatalog) -> Result<ResolvedDependency> {
    let specifier = DependencySpecifier::new(name, Some(constraint.to_string()))?;
    VersionResolver::resolve(&specifier, catalog)
}
