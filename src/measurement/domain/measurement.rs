use super::dependency::{ChangeKind, ResolvedDependency};
use super::downloads::Downloads;
use serde::Serialize;

/// What one sandboxed install of a package produced.
///
/// `subdependency_count` is `None` when the lockfile of a non-baseline
/// install could not be read. `downloads_last_week` is `None` when the
/// registry had no figure for the version or the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementResult {
    pub installed_size_bytes: u64,
    pub subdependency_count: Option<u64>,
    pub downloads_last_week: Option<u64>,
    pub total_downloads: u64,
}

impl MeasurementResult {
    /// Fills in the download figures for `dependency`.
    pub fn with_downloads(
        mut self,
        dependency: &ResolvedDependency,
        downloads: &Downloads,
    ) -> Self {
        self.downloads_last_week = downloads.for_version(&dependency.version);
        self.total_downloads = downloads.total();
        self
    }
}

/// One added or removed dependency with its measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub dependency: ResolvedDependency,
    pub kind: ChangeKind,
    pub measurement: MeasurementResult,
}

impl DiffEntry {
    pub fn new(
        dependency: ResolvedDependency,
        kind: ChangeKind,
        measurement: MeasurementResult,
    ) -> Self {
        Self {
            dependency,
            kind,
            measurement,
        }
    }
}
