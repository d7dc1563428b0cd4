use crate::application::dto::{ResolutionReport, UnresolvedDependency};
use crate::measurement::domain::{
    DependencySpecifier, ManifestDependency, PackageManifest, ResolvedDependency, VersionCatalog,
};
use crate::measurement::services::VersionResolver;
use crate::ports::outbound::PackageRegistry;
use crate::shared::error::SizeError;
use crate::shared::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Number of concurrent registry lookups when resolving a manifest
pub const DEFAULT_RESOLVER_WORKERS: usize = 2;

/// ResolveDependenciesUseCase - Turns npm ranges into concrete versions
///
/// Single specifiers are resolved inline. Whole dependency lists go through
/// a fixed pool of workers so a large manifest never opens more than
/// `workers` registry requests at once.
///
/// # Type Parameters
/// * `R` - PackageRegistry implementation
pub struct ResolveDependenciesUseCase<R> {
    registry: Arc<R>,
    workers: usize,
}

impl<R> ResolveDependenciesUseCase<R>
where
    R: PackageRegistry + 'static,
{
    /// Creates the use case. A worker count of zero is raised to one.
    pub fn new(registry: Arc<R>, workers: usize) -> Self {
        Self {
            registry,
            workers: workers.max(1),
        }
    }

    /// Resolves free-form input such as `react@^18` to one version.
    ///
    /// # Returns
    /// The resolved dependency and the catalog it was resolved against
    ///
    /// # Errors
    /// Input and resolution errors are retryable (see
    /// [`crate::shared::error::is_retryable`]); registry errors are not.
    pub async fn resolve_specifier(
        &self,
        input: &str,
    ) -> Result<(ResolvedDependency, Arc<VersionCatalog>)> {
        let specifier = DependencySpecifier::parse(input)?;
        let catalog = self.registry.get_catalog(specifier.name()).await?;
        let resolved = VersionResolver::resolve(&specifier, &catalog)?;
        tracing::debug!(input, resolved = %resolved, "Resolved specifier");
        Ok((resolved, catalog))
    }

    /// Resolves the direct dependencies of a manifest.
    ///
    /// # Returns
    /// Resolved dependencies sorted by name, and the ones that failed with
    /// the reason. Constraints that are not ranges (tags, URLs) are skipped
    /// without being reported.
    pub async fn resolve_manifest(
        &self,
        manifest: &PackageManifest,
        include_dev: bool,
    ) -> (Vec<ResolvedDependency>, Vec<UnresolvedDependency>) {
        let dependencies = manifest.resolvable_dependencies(include_dev);
        let total = dependencies.len();
        if total == 0 {
            return (Vec::new(), Vec::new());
        }

        let (work_tx, work_rx) = mpsc::channel::<ManifestDependency>(total);
        let (result_tx, mut result_rx) = mpsc::channel(total);
        let work_rx = Arc::new(Mutex::new(work_rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.workers.min(total) {
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            let registry = Arc::clone(&self.registry);

            workers.spawn(async move {
                loop {
                    let next = work_rx.lock().await.recv().await;
                    let Some(dependency) = next else {
                        break;
                    };
                    let outcome = resolve_one(registry.as_ref(), dependency).await;
                    if result_tx.send(outcome).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for dependency in dependencies {
            if work_tx.send(dependency).await.is_err() {
                break;
            }
        }
        // Closing the queue lets idle workers exit
        drop(work_tx);

        let mut resolved = Vec::with_capacity(total);
        let mut unresolved = Vec::new();
        while let Some(outcome) = result_rx.recv().await {
            match outcome {
                Ok(dependency) => resolved.push(dependency),
                Err(failure) => unresolved.push(failure),
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Resolver worker stopped unexpectedly: {}", e);
            }
        }

        resolved.sort();
        unresolved.sort_by(|a, b| a.name.cmp(&b.name));
        (resolved, unresolved)
    }

    /// Resolves a package and then its direct dependencies.
    pub async fn execute(&self, input: &str, include_dev: bool) -> Result<ResolutionReport> {
        let (package, catalog) = self.resolve_specifier(input).await?;
        let entry = catalog
            .get(&package.version)
            .ok_or_else(|| SizeError::NoMatchingVersion {
                name: package.name.clone(),
                constraint: package.version.to_string(),
            })?;

        let (resolved, unresolved) = self.resolve_manifest(&entry.manifest, include_dev).await;
        Ok(ResolutionReport {
            package,
            resolved,
            unresolved,
        })
    }
}

async fn resolve_one<R>(
    registry: &R,
    dependency: ManifestDependency,
) -> std::result::Result<ResolvedDependency, UnresolvedDependency>
where
    R: PackageRegistry + ?Sized,
{
    let unresolved = |e: anyhow::Error| UnresolvedDependency {
        name: dependency.name.clone(),
        constraint: dependency.constraint.clone(),
        reason: e.to_string().lines().next().unwrap_or_default().to_string(),
    };

    let catalog = registry
        .get_catalog(&dependency.name)
        .await
        .map_err(unresolved)?;
    let entry =
        VersionResolver::resolve_entry(&dependency.name, Some(&dependency.constraint), &catalog)
            .map_err(unresolved)?;

    Ok(ResolvedDependency::new(
        dependency.name.clone(),
        entry.version.clone(),
    ))
}
