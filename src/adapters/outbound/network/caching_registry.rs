use crate::measurement::domain::{Downloads, VersionCatalog};
use crate::ports::outbound::PackageRegistry;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Shared catalog store, keyed by package name.
pub type CatalogCache = Arc<DashMap<String, Arc<VersionCatalog>>>;

/// CachingRegistry wraps a PackageRegistry and keeps every fetched catalog.
///
/// This adapter implements the decorator pattern. The cache is injected so
/// callers own its lifetime and tests can inspect it. It is safe for
/// concurrent reads and inserts; when two tasks miss on the same name at
/// once, both fetch and the first stored catalog wins.
///
/// Download counts are passed through uncached.
pub struct CachingRegistry<R: PackageRegistry> {
    inner: R,
    cache: CatalogCache,
}

impl<R: PackageRegistry> CachingRegistry<R> {
    /// Creates a caching registry with a fresh, empty cache
    pub fn new(inner: R) -> Self {
        Self::with_cache(inner, Arc::new(DashMap::new()))
    }

    /// Creates a caching registry around an existing cache
    pub fn with_cache(inner: R, cache: CatalogCache) -> Self {
        Self { inner, cache }
    }

    /// Returns the number of cached catalogs
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<R: PackageRegistry> PackageRegistry for CachingRegistry<R> {
    async fn get_catalog(&self, package_name: &str) -> Result<Arc<VersionCatalog>> {
        if let Some(cached) = self.cache.get(package_name) {
            tracing::trace!(package = package_name, "Catalog cache hit");
            return Ok(Arc::clone(&cached));
        }

        let catalog = self.inner.get_catalog(package_name).await?;

        let stored = self
            .cache
            .entry(package_name.to_string())
            .or_insert(catalog);
        Ok(Arc::clone(&stored))
    }

    async fn get_weekly_downloads(&self, package_name: &str) -> Result<Downloads> {
        self.inner.get_weekly_downloads(package_name).await
    }

    fn clear_cache(&self) {
        self.cache.clear();
        self.inner.clear_cache();
    }
}
