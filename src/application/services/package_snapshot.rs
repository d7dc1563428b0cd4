use super::package_measurer::{PackageMeasurer, SandboxMeasurement};
use super::sandbox_executor::InstallTarget;
use crate::application::dto::{LatestVersion, PackageSnapshot};
use crate::measurement::domain::{
    Downloads, MeasurementResult, ResolvedDependency, VersionCatalog,
};
use crate::measurement::services::{traffic, DiffAggregator};
use crate::ports::outbound::{ContainerRuntime, PackageRegistry, SandboxArtifacts};
use crate::shared::error::SizeError;
use crate::shared::Result;
use anyhow::Context;

/// Weekly downloads of a package, or `None` with a warning when the lookup fails.
pub async fn fetch_downloads<R>(registry: &R, package_name: &str) -> Option<Downloads>
where
    R: PackageRegistry + ?Sized,
{
    match registry.get_weekly_downloads(package_name).await {
        Ok(downloads) => Some(downloads),
        Err(e) => {
            tracing::warn!(package = package_name, "Download counts unavailable: {:#}", e);
            None
        }
    }
}

/// Installs `package` on its own and captures everything known about it.
pub async fn capture_snapshot<R, C, A>(
    registry: &R,
    measurer: &PackageMeasurer<C, A>,
    package: &ResolvedDependency,
) -> Result<PackageSnapshot>
where
    R: PackageRegistry + ?Sized,
    C: ContainerRuntime,
    A: SandboxArtifacts + 'static,
{
    let catalog = registry.get_catalog(&package.name).await?;
    let target = InstallTarget::Package(package.clone());

    let (downloads, measured) = tokio::join!(
        fetch_downloads(registry, &package.name),
        measurer.measure(&target)
    );

    build_snapshot(&catalog, package, measured?, downloads.as_ref())
}

/// Turns a finished install into a snapshot.
///
/// The lockfile is required here: without it there is no sub-dependency
/// count to compare against.
pub fn build_snapshot(
    catalog: &VersionCatalog,
    package: &ResolvedDependency,
    measured: SandboxMeasurement,
    downloads: Option<&Downloads>,
) -> Result<PackageSnapshot> {
    let entry = catalog
        .get(&package.version)
        .ok_or_else(|| SizeError::NoMatchingVersion {
            name: package.name.clone(),
            constraint: package.version.to_string(),
        })?;

    let lockfile = measured
        .lockfile
        .with_context(|| format!("Cannot count the dependencies of {}", package))?;

    let mut measurement = MeasurementResult {
        installed_size_bytes: measured.installed_size_bytes,
        subdependency_count: Some(lockfile.subdependency_count()),
        ..Default::default()
    };
    if let Some(downloads) = downloads {
        measurement = measurement.with_downloads(package, downloads);
    }

    let latest = catalog
        .latest()
        .filter(|latest| latest.version != package.version)
        .map(|latest| LatestVersion {
            version: latest.version.clone(),
            released_at: latest.released_at,
        });

    Ok(PackageSnapshot {
        package: package.clone(),
        released_at: entry.released_at,
        latest,
        traffic_last_week: traffic(
            measurement.downloads_last_week,
            measurement.installed_size_bytes,
        ),
        percent_downloads_of_version: DiffAggregator::percent_downloads_of_version(&measurement),
        measurement,
        manifest: entry.manifest.clone(),
        lockfile,
    })
}
