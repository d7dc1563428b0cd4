use async_trait::async_trait;
use package_size::measurement::domain::{CatalogVersion, Downloads};
use package_size::prelude::*;
use package_size::shared::error::SizeError;
use semver::Version;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock PackageRegistry serving in-memory catalogs
#[derive(Default)]
pub struct MockRegistry {
    catalogs: HashMap<String, VersionCatalog>,
    downloads: HashMap<String, Downloads>,
    catalog_requests: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `versions` of `name` with bare manifests.
    pub fn with_package(mut self, name: &str, versions: &[&str], latest: &str) -> Self {
        let mut catalog = VersionCatalog::new(name);
        for v in versions {
            let version = Version::parse(v).unwrap();
            catalog.insert(CatalogVersion {
                version: version.clone(),
                released_at: None,
                manifest: PackageManifest {
                    name: name.to_string(),
                    version: version.to_string(),
                    ..Default::default()
                },
            });
        }
        catalog.set_latest(Version::parse(latest).unwrap());
        self.catalogs.insert(name.to_string(), catalog);
        self
    }

    /// Declares the `dependencies` of one published version.
    pub fn with_dependencies(mut self, name: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        let old = self.catalogs.remove(name).expect("package must be published first");
        let version = Version::parse(version).unwrap();
        let latest = old.latest().map(|l| l.version.clone());

        let mut catalog = VersionCatalog::new(name);
        for entry in old.versions_descending() {
            let mut entry = entry.clone();
            if entry.version == version {
                entry.manifest.dependencies = deps
                    .iter()
                    .map(|(n, c)| (n.to_string(), c.to_string()))
                    .collect();
            }
            catalog.insert(entry);
        }
        if let Some(latest) = latest {
            catalog.set_latest(latest);
        }
        self.catalogs.insert(name.to_string(), catalog);
        self
    }

    pub fn with_downloads(mut self, name: &str, per_version: &[(&str, u64)]) -> Self {
        let downloads = per_version
            .iter()
            .map(|(v, count)| (v.to_string(), *count))
            .collect();
        self.downloads.insert(name.to_string(), downloads);
        self
    }

    pub fn catalog_requests(&self, name: &str) -> usize {
        self.catalog_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }
}

#[async_trait]
impl PackageRegistry for MockRegistry {
    async fn get_catalog(&self, package_name: &str) -> Result<Arc<VersionCatalog>> {
        self.catalog_requests
            .lock()
            .unwrap()
            .push(package_name.to_string());
        self.catalogs
            .get(package_name)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| {
                SizeError::PackageNotFound {
                    name: package_name.to_string(),
                }
                .into()
            })
    }

    async fn get_weekly_downloads(&self, package_name: &str) -> Result<Downloads> {
        self.downloads.get(package_name).cloned().ok_or_else(|| {
            SizeError::Registry {
                name: package_name.to_string(),
                details: "status 503".to_string(),
            }
            .into()
        })
    }
}
