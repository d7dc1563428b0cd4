use crate::measurement::domain::{CatalogVersion, Downloads, PackageManifest, VersionCatalog};
use crate::ports::outbound::PackageRegistry;
use crate::shared::error::SizeError;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use reqwest::StatusCode;
use semver::Version;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.com";
pub const DEFAULT_API_URL: &str = "https://api.npmjs.org";
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: IndexMap<String, PackageManifest>,
    /// Version → RFC 3339 timestamp, plus `created`/`modified`. Unpublished
    /// packages put an object here, so values stay untyped.
    #[serde(default)]
    time: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DownloadsDocument {
    #[serde(default)]
    downloads: HashMap<String, u64>,
}

/// NpmRegistryClient adapter for the npm registry and download-count API
///
/// This adapter implements the PackageRegistry port over HTTP. It performs
/// no caching and no retries: wrap it in
/// [`CachingRegistry`](super::CachingRegistry) to share catalogs between
/// concurrent lookups.
pub struct NpmRegistryClient {
    client: reqwest::Client,
    registry_url: String,
    api_url: String,
}

impl NpmRegistryClient {
    /// Creates a client for the given base URLs
    ///
    /// # Arguments
    /// * `registry_url` - Metadata endpoint base, e.g. `https://registry.npmjs.com`
    /// * `api_url` - Download-count endpoint base, e.g. `https://api.npmjs.org`
    /// * `timeout` - Applies to every request, connect and body included
    pub fn new(registry_url: &str, api_url: &str, timeout: Duration) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("package-size/{}", version);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn catalog_url(&self, package_name: &str) -> String {
        format!("{}/{}", self.registry_url, encode_package_name(package_name))
    }

    pub fn downloads_url(&self, package_name: &str) -> String {
        format!(
            "{}/versions/{}/last-week",
            self.api_url,
            encode_package_name(package_name)
        )
    }

    async fn fetch_json<T: DeserializeOwned>(&self, package_name: &str, url: &str) -> Result<T> {
        tracing::debug!(package = package_name, url, "Fetching from registry");

        let registry_error = |details: String| SizeError::Registry {
            name: package_name.to_string(),
            details,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| registry_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SizeError::PackageNotFound {
                name: package_name.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(registry_error(format!("{} returned status code {}", url, status)).into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| registry_error(format!("invalid response body: {}", e)).into())
    }
}

#[async_trait]
impl PackageRegistry for NpmRegistryClient {
    async fn get_catalog(&self, package_name: &str) -> Result<Arc<VersionCatalog>> {
        let url = self.catalog_url(package_name);
        let document: RegistryDocument = self.fetch_json(package_name, &url).await?;
        let catalog = build_catalog(package_name, document);

        tracing::debug!(
            package = package_name,
            versions = catalog.len(),
            "Fetched package catalog"
        );

        Ok(Arc::new(catalog))
    }

    async fn get_weekly_downloads(&self, package_name: &str) -> Result<Downloads> {
        let url = self.downloads_url(package_name);
        let document: DownloadsDocument = self.fetch_json(package_name, &url).await?;
        Ok(Downloads::new(document.downloads))
    }
}

/// Path-escapes a package name, keeping the leading `@` of a scope.
pub fn encode_package_name(package_name: &str) -> String {
    match package_name.strip_prefix('@') {
        Some(scoped) => format!("@{}", urlencoding::encode(scoped)),
        None => urlencoding::encode(package_name).into_owned(),
    }
}

fn build_catalog(package_name: &str, document: RegistryDocument) -> VersionCatalog {
    let mut catalog = VersionCatalog::new(package_name);

    for (raw_version, manifest) in document.versions {
        let version = match Version::parse(&raw_version) {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(
                    package = package_name,
                    version = %raw_version,
                    error = %e,
                    "Skipping version that is not valid semver"
                );
                continue;
            }
        };

        let released_at = document
            .time
            .get(&raw_version)
            .and_then(|t| t.as_str())
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        if !catalog.insert(CatalogVersion {
            version,
            released_at,
            manifest,
        }) {
            tracing::warn!(
                package = package_name,
                version = %raw_version,
                "Duplicate version entry, keeping the first"
            );
        }
    }

    match document.dist_tags.get("latest").map(|v| Version::parse(v)) {
        Some(Ok(latest)) => catalog.set_latest(latest),
        Some(Err(e)) => {
            tracing::warn!(package = package_name, error = %e, "Ignoring invalid latest dist-tag")
        }
        None => tracing::debug!(package = package_name, "Package has no latest dist-tag"),
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> RegistryDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = NpmRegistryClient::new(
            DEFAULT_REGISTRY_URL,
            DEFAULT_API_URL,
            DEFAULT_REGISTRY_TIMEOUT,
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_urls_escape_scoped_names() {
        let client = NpmRegistryClient::new(
            "http://registry.local/",
            "http://api.local",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            client.catalog_url("@types/node"),
            "http://registry.local/@types%2Fnode"
        );
        assert_eq!(
            client.downloads_url("left-pad"),
            "http://api.local/versions/left-pad/last-week"
        );
    }

    #[test]
    fn test_build_catalog() {
        let catalog = build_catalog(
            "demo",
            document(
                r#"{
                    "name": "demo",
                    "dist-tags": {"latest": "1.1.0", "next": "2.0.0-rc.1"},
                    "versions": {
                        "1.0.0": {"name": "demo", "version": "1.0.0"},
                        "1.1.0": {"name": "demo", "version": "1.1.0", "dependencies": {"dep": "^2.0.0"}},
                        "2.0.0-rc.1": {"name": "demo", "version": "2.0.0-rc.1"},
                        "banana": {"name": "demo", "version": "banana"}
                    },
                    "time": {
                        "created": "2020-01-01T00:00:00.000Z",
                        "1.0.0": "2020-01-01T00:00:00.000Z",
                        "1.1.0": "not a date"
                    }
                }"#,
            ),
        );

        assert_eq!(catalog.len(), 3);
        let latest = catalog.latest().unwrap();
        assert_eq!(latest.version, Version::new(1, 1, 0));
        assert_eq!(latest.released_at, None);
        assert_eq!(latest.manifest.dependencies.get("dep").unwrap(), "^2.0.0");

        let first = catalog.get(&Version::new(1, 0, 0)).unwrap();
        assert_eq!(
            first.released_at.unwrap().to_rfc3339(),
            "2020-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_build_catalog_unpublished_package() {
        let catalog = build_catalog(
            "gone",
            document(r#"{"name": "gone", "time": {"unpublished": {"time": "2021-01-01T00:00:00.000Z"}}}"#),
        );
        assert!(catalog.is_empty());
        assert!(catalog.latest().is_none());
    }

    #[test]
    fn test_downloads_document() {
        let document: DownloadsDocument = serde_json::from_str(
            r#"{"package": "demo", "downloads": {"1.0.0": 5, "1.1.0": 7}}"#,
        )
        .unwrap();
        let downloads = Downloads::new(document.downloads);
        assert_eq!(downloads.total(), 12);
    }
}
