use crate::measurement::domain::{Downloads, VersionCatalog};
use crate::shared::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// PackageRegistry port for reading package metadata
///
/// This port abstracts the npm registry and its download-count API.
///
/// # Async Support
/// All methods are async so many packages can be looked up concurrently.
/// Implementations must be `Send + Sync` to support concurrent access.
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Fetches the catalog of every published version of a package
    ///
    /// # Arguments
    /// * `package_name` - Package name, scoped names included
    ///
    /// # Returns
    /// A shared, immutable catalog snapshot
    ///
    /// # Errors
    /// Returns an error if:
    /// - The package does not exist (`SizeError::PackageNotFound`)
    /// - The network request fails or the response cannot be parsed
    async fn get_catalog(&self, package_name: &str) -> Result<Arc<VersionCatalog>>;

    /// Fetches last week's download counts per version
    ///
    /// Counts change daily, implementations must not cache them.
    ///
    /// # Errors
    /// Returns an error if the network request fails or the response cannot be parsed
    async fn get_weekly_downloads(&self, package_name: &str) -> Result<Downloads>;

    /// Drops cached catalogs. No-op for registries without a cache.
    fn clear_cache(&self) {}
}

#[async_trait]
impl<R: PackageRegistry + ?Sized> PackageRegistry for Arc<R> {
    async fn get_catalog(&self, package_name: &str) -> Result<Arc<VersionCatalog>> {
        (**self).get_catalog(package_name).await
    }

    async fn get_weekly_downloads(&self, package_name: &str) -> Result<Downloads> {
        (**self).get_weekly_downloads(package_name).await
    }

    fn clear_cache(&self) {
        (**self).clear_cache()
    }
}
