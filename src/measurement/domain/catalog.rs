use super::manifest::PackageManifest;
use chrono::{DateTime, Utc};
use semver::Version;
use std::collections::BTreeMap;

/// One published version of a package.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogVersion {
    pub version: Version,
    pub released_at: Option<DateTime<Utc>>,
    pub manifest: PackageManifest,
}

/// Snapshot of every known version of one package.
///
/// Each version maps to exactly one entry. Once a catalog is handed out by
/// the registry client it is shared behind an `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCatalog {
    name: String,
    versions: BTreeMap<Version, CatalogVersion>,
    latest: Option<Version>,
}

impl VersionCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: BTreeMap::new(),
            latest: None,
        }
    }

    /// Adds a version. Returns false (and keeps the existing entry) when the
    /// version is already present.
    pub fn insert(&mut self, entry: CatalogVersion) -> bool {
        if self.versions.contains_key(&entry.version) {
            return false;
        }
        self.versions.insert(entry.version.clone(), entry);
        true
    }

    /// Records the version the `latest` dist-tag points at.
    pub fn set_latest(&mut self, version: Version) {
        self.latest = Some(version);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `latest` entry, if the tag points at a version in this catalog.
    pub fn latest(&self) -> Option<&CatalogVersion> {
        self.latest.as_ref().and_then(|v| self.versions.get(v))
    }

    pub fn get(&self, version: &Version) -> Option<&CatalogVersion> {
        self.versions.get(version)
    }

    /// Versions from highest to lowest semantic version.
    pub fn versions_descending(&self) -> impl Iterator<Item = &CatalogVersion> {
        self.versions.values().rev()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Catalog with bare manifests for the given versions.
    pub fn catalog(name: &str, versions: &[&str], latest: &str) -> VersionCatalog {
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
        catalog
    }
}
