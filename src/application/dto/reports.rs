use crate::measurement::domain::{Lockfile, MeasurementResult, PackageManifest, ResolvedDependency};
use crate::measurement::services::{DependencyShare, DiffStatistics, SizeDifference};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::Serialize;

/// The registry's `latest` tag, when it points elsewhere than the measured version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestVersion {
    pub version: Version,
    pub released_at: Option<DateTime<Utc>>,
}

/// A package installed on its own and measured.
///
/// The manifest and lockfile are kept for follow-up work (removal
/// candidates, the edited-manifest install) but are not part of any
/// rendered report.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSnapshot {
    pub package: ResolvedDependency,
    pub released_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<LatestVersion>,
    pub measurement: MeasurementResult,
    pub traffic_last_week: Option<u128>,
    pub percent_downloads_of_version: Option<f64>,
    #[serde(skip)]
    pub manifest: PackageManifest,
    #[serde(skip)]
    pub lockfile: Lockfile,
}

/// Result of installing the edited manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedInstall {
    pub installed_size_bytes: u64,
    /// Entries in the resulting lockfile, root included. `None` when it could not be read.
    pub package_count: Option<usize>,
}

/// ChangeReport - Response DTO of the change estimation use case
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub package: PackageSnapshot,
    pub statistics: DiffStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<VerifiedInstall>,
}

/// Two versions of one package side by side.
#[derive(Debug, Clone, Serialize)]
pub struct VersionComparisonReport {
    pub old: PackageSnapshot,
    pub new: PackageSnapshot,
    pub difference: SizeDifference,
    /// New minus old sub-dependency count
    pub subdependency_change: Option<i64>,
}

/// A direct dependency whose constraint could not be turned into a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDependency {
    pub name: String,
    pub constraint: String,
    pub reason: String,
}

/// Direct dependencies of a package resolved against the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub package: ResolvedDependency,
    /// Sorted by name
    pub resolved: Vec<ResolvedDependency>,
    pub unresolved: Vec<UnresolvedDependency>,
}

/// Every direct dependency of a package with its share of the package.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub package: PackageSnapshot,
    pub dependencies: Vec<DependencyShare>,
    pub unresolved: Vec<UnresolvedDependency>,
    /// Sum of the stand-alone sizes of the dependencies. Shared
    /// sub-dependencies are counted once per dependency.
    pub total_dependency_size_bytes: u64,
}

/// Any report the CLI can render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Measure(PackageSnapshot),
    Change(ChangeReport),
    Versions(VersionComparisonReport),
    Dependencies(BatchReport),
    Resolution(ResolutionReport),
}
