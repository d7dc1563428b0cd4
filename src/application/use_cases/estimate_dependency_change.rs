use crate::application::dto::{ChangeReport, ChangeRequest, PackageSnapshot, VerifiedInstall};
use crate::application::services::{
    capture_snapshot, FanOutCoordinator, InstallTarget, PackageMeasurer,
};
use crate::measurement::domain::{
    ChangeKind, DependencySpecifier, DiffEntry, PackageManifest, ResolvedDependency,
};
use crate::measurement::services::{DiffAggregator, VersionResolver};
use crate::ports::outbound::{ContainerRuntime, PackageRegistry, ProgressReporter, SandboxArtifacts};
use crate::shared::error::SizeError;
use crate::shared::Result;
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// EstimateDependencyChangeUseCase - Size impact of removing or adding dependencies
///
/// The package is installed once as the baseline and every changed
/// dependency is installed on its own. The new size is estimated from those
/// measurements; optionally the edited manifest is installed too, to compare
/// the estimate with reality.
///
/// # Type Parameters
/// * `R` - PackageRegistry implementation
/// * `C` - ContainerRuntime implementation
/// * `A` - SandboxArtifacts implementation
/// * `P` - ProgressReporter implementation
pub struct EstimateDependencyChangeUseCase<R, C, A, P> {
    registry: Arc<R>,
    measurer: PackageMeasurer<C, A>,
    progress_reporter: P,
}

impl<R, C, A, P> EstimateDependencyChangeUseCase<R, C, A, P>
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

    /// Installs and measures the package on its own.
    ///
    /// # Errors
    /// Any sandbox error, and a missing or unsupported baseline lockfile.
    pub async fn measure_package(&self, package: &ResolvedDependency) -> Result<PackageSnapshot> {
        self.progress_reporter
            .report(&format!("📦 Installing {} in a sandbox...", package));
        capture_snapshot(self.registry.as_ref(), &self.measurer, package).await
    }

    /// Direct dependencies of a measured package, at their installed version.
    ///
    /// Dependencies missing from the baseline lockfile are skipped.
    pub fn removal_candidates(snapshot: &PackageSnapshot) -> Vec<ResolvedDependency> {
        snapshot
            .manifest
            .dependencies
            .keys()
            .filter_map(|name| match snapshot.lockfile.installed_version(name) {
                Some(version) => Some(ResolvedDependency::new(name.clone(), version)),
                None => {
                    tracing::warn!(
                        package = %snapshot.package,
                        dependency = name.as_str(),
                        "Dependency not found in the baseline lockfile, it cannot be removed"
                    );
                    None
                }
            })
            .collect()
    }

    /// Turns `--remove` arguments into dependencies.
    ///
    /// A bare name picks the installed version from the baseline; a name
    /// with a constraint is resolved against the registry.
    ///
    /// # Errors
    /// [`SizeError::InvalidSpecifier`] when a bare name is not an installed
    /// direct dependency, plus the usual resolution errors.
    pub async fn select_removals(
        &self,
        snapshot: &PackageSnapshot,
        inputs: &[String],
    ) -> Result<Vec<ResolvedDependency>> {
        let candidates = Self::removal_candidates(snapshot);
        let mut removals = Vec::with_capacity(inputs.len());

        for input in inputs {
            let specifier = DependencySpecifier::parse(input)?;
            let dependency = match specifier.constraint() {
                Some(_) => self.resolve(&specifier).await?,
                None => candidates
                    .iter()
                    .find(|candidate| candidate.name == specifier.name())
                    .cloned()
                    .ok_or_else(|| SizeError::InvalidSpecifier {
                        input: input.clone(),
                        reason: format!(
                            "{} is not an installed direct dependency of {}",
                            specifier.name(),
                            snapshot.package
                        ),
                    })?,
            };
            removals.push(dependency);
        }
        Ok(removals)
    }

    /// Resolves specifiers such as `left-pad@^1.3` concurrently.
    pub async fn resolve_all(&self, inputs: &[String]) -> Result<Vec<ResolvedDependency>> {
        try_join_all(inputs.iter().map(|input| async move {
            let specifier = DependencySpecifier::parse(input)?;
            self.resolve(&specifier).await
        }))
        .await
    }

    /// Builds a request from command-line style inputs.
    ///
    /// The baseline is measured up front only when a removal needs the
    /// installed version; otherwise it runs alongside the other installs.
    pub async fn prepare_request(
        &self,
        package: ResolvedDependency,
        remove: &[String],
        add: &[String],
        verify: bool,
    ) -> Result<ChangeRequest> {
        let needs_baseline = remove.iter().any(|input| {
            DependencySpecifier::parse(input)
                .map(|specifier| specifier.constraint().is_none())
                .unwrap_or(false)
        });

        let (baseline, removed) = if needs_baseline {
            let snapshot = self.measure_package(&package).await?;
            let removed = self.select_removals(&snapshot, remove).await?;
            (Some(snapshot), removed)
        } else {
            (None, self.resolve_all(remove).await?)
        };
        let added = self.resolve_all(add).await?;

        let request = ChangeRequest::new(package, removed, added).with_verification(verify);
        Ok(match baseline {
            Some(snapshot) => request.with_baseline(snapshot),
            None => request,
        })
    }

    /// Estimates the effect of the requested change.
    ///
    /// Duplicate dependencies are measured once. The baseline (when not
    /// supplied), the per-dependency installs and the optional edited-manifest
    /// install all run concurrently.
    pub async fn execute(&self, request: ChangeRequest) -> Result<ChangeReport> {
        let ChangeRequest {
            package,
            baseline,
            removed,
            added,
            verify,
        } = request;
        let removed = dedupe(removed);
        let added = dedupe(added);

        let catalog = self.registry.get_catalog(&package.name).await?;
        let manifest = catalog
            .get(&package.version)
            .map(|entry| entry.manifest.clone())
            .ok_or_else(|| SizeError::NoMatchingVersion {
                name: package.name.clone(),
                constraint: package.version.to_string(),
            })?;

        let changed: Vec<ResolvedDependency> = removed.iter().chain(&added).cloned().collect();
        self.progress_reporter.report(&format!(
            "📦 Measuring {} changed dependencies of {} in sandboxes...",
            changed.len(),
            package
        ));

        let coordinator = FanOutCoordinator::new(
            self.registry.as_ref(),
            &self.measurer,
            &self.progress_reporter,
        );

        let (baseline, measured, verified) = tokio::join!(
            async {
                match baseline {
                    Some(snapshot) => Ok(snapshot),
                    None => {
                        capture_snapshot(self.registry.as_ref(), &self.measurer, &package).await
                    }
                }
            },
            coordinator.measure_all(&changed),
            async {
                if verify {
                    Some(self.measure_modified(&package, &manifest, &added, &removed).await)
                } else {
                    None
                }
            }
        );
        let baseline = baseline?;
        let measured = measured?;
        let verified = verified.transpose()?;

        let entries: Vec<DiffEntry> = removed
            .iter()
            .map(|dependency| (dependency, ChangeKind::Removed))
            .chain(added.iter().map(|dependency| (dependency, ChangeKind::Added)))
            .filter_map(|(dependency, kind)| {
                measured
                    .get(&dependency.key())
                    .map(|m| DiffEntry::new(dependency.clone(), kind, m.clone()))
            })
            .collect();

        let statistics = DiffAggregator::aggregate(&baseline.measurement, &entries);
        self.progress_reporter
            .report_completion(&format!("✅ Estimated the change for {}", package));

        Ok(ChangeReport {
            package: baseline,
            statistics,
            verified,
        })
    }

    /// Installs the manifest with the change applied.
    ///
    /// An unreadable lockfile only leaves the package count unknown.
    pub async fn measure_modified(
        &self,
        package: &ResolvedDependency,
        manifest: &PackageManifest,
        added: &[ResolvedDependency],
        removed: &[ResolvedDependency],
    ) -> Result<VerifiedInstall> {
        let target = InstallTarget::Manifest {
            label: format!("{} (edited)", package),
            manifest: manifest.with_changes(added, removed),
        };
        let measured = self.measurer.measure(&target).await?;

        let package_count = match measured.lockfile {
            Ok(lockfile) => Some(lockfile.package_count()),
            Err(e) => {
                tracing::warn!(package = %package, "Edited install has no usable lockfile: {:#}", e);
                None
            }
        };

        Ok(VerifiedInstall {
            installed_size_bytes: measured.installed_size_bytes,
            package_count,
        })
    }

    async fn resolve(&self, specifier: &DependencySpecifier) -> Result<ResolvedDependency> {
        let catalog = self.registry.get_catalog(specifier.name()).await?;
        VersionResolver::resolve(specifier, &catalog)
    }
}

fn dedupe(dependencies: Vec<ResolvedDependency>) -> Vec<ResolvedDependency> {
    let mut seen = HashSet::new();
    dependencies
        .into_iter()
        .filter(|dependency| seen.insert(dependency.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let a = ResolvedDependency::new("a", Version::new(1, 0, 0));
        let b = ResolvedDependency::new("b", Version::new(1, 0, 0));
        let a2 = ResolvedDependency::new("a", Version::new(2, 0, 0));

        let deduped = dedupe(vec![a.clone(), b.clone(), a.clone(), a2.clone()]);
        assert_eq!(deduped, vec![a, b, a2]);
    }
}
