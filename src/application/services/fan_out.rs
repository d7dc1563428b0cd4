use super::package_measurer::PackageMeasurer;
use super::package_snapshot::fetch_downloads;
use super::sandbox_executor::InstallTarget;
use crate::measurement::domain::{MeasurementResult, ResolvedDependency};
use crate::ports::outbound::{ContainerRuntime, PackageRegistry, ProgressReporter, SandboxArtifacts};
use crate::shared::Result;
use futures::future::join_all;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// FanOutCoordinator measures a set of independent dependencies concurrently
///
/// Each distinct `name@version` is installed by exactly one task. A sandbox
/// failure in any task fails the whole batch. Missing download counts or an
/// unreadable lockfile only leave the affected figures unknown.
pub struct FanOutCoordinator<'a, R: ?Sized, C, A, P> {
    registry: &'a R,
    measurer: &'a PackageMeasurer<C, A>,
    progress_reporter: &'a P,
}

impl<'a, R, C, A, P> FanOutCoordinator<'a, R, C, A, P>
where
    R: PackageRegistry + ?Sized,
    C: ContainerRuntime,
    A: SandboxArtifacts + 'static,
    P: ProgressReporter,
{
    pub fn new(
        registry: &'a R,
        measurer: &'a PackageMeasurer<C, A>,
        progress_reporter: &'a P,
    ) -> Self {
        Self {
            registry,
            measurer,
            progress_reporter,
        }
    }

    /// Measures every dependency, keyed by `name@version`.
    ///
    /// Blocks until every task has finished, then returns the first error
    /// in input order if any task failed.
    pub async fn measure_all(
        &self,
        dependencies: &[ResolvedDependency],
    ) -> Result<IndexMap<String, MeasurementResult>> {
        let mut unique: IndexMap<String, &ResolvedDependency> = IndexMap::new();
        for dependency in dependencies {
            unique.entry(dependency.key()).or_insert(dependency);
        }

        let total = unique.len();
        if total == 0 {
            return Ok(IndexMap::new());
        }

        let completed = AtomicUsize::new(0);
        let tasks = unique.iter().map(|(key, dependency)| {
            let completed = &completed;
            async move {
                let result = self.measure_one(dependency).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                self.progress_reporter
                    .report_progress(done, total, Some(key.as_str()));
                (key.clone(), result)
            }
        });

        let mut measured = IndexMap::with_capacity(total);
        for (key, result) in join_all(tasks).await {
            measured.insert(key, result?);
        }
        Ok(measured)
    }

    /// Installs one dependency while its download counts are fetched.
    pub async fn measure_one(&self, dependency: &ResolvedDependency) -> Result<MeasurementResult> {
        let target = InstallTarget::Package(dependency.clone());
        let (downloads, measured) = tokio::join!(
            fetch_downloads(self.registry, &dependency.name),
            self.measurer.measure(&target)
        );
        let measured = measured?;

        let subdependency_count = match measured.lockfile {
            Ok(lockfile) => Some(lockfile.subdependency_count()),
            Err(e) => {
                tracing::warn!(
                    package = %dependency,
                    "Sub-dependency count unknown: {:#}",
                    e
                );
                None
            }
        };

        let measurement = MeasurementResult {
            installed_size_bytes: measured.installed_size_bytes,
            subdependency_count,
            ..Default::default()
        };

        Ok(match downloads {
            Some(downloads) => measurement.with_downloads(dependency, &downloads),
            None => measurement,
        })
    }
}
