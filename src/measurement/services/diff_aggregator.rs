use crate::measurement::domain::{ChangeKind, DiffEntry, MeasurementResult, ResolvedDependency};
use serde::Serialize;

/// `100 × part / whole`, or `None` when `whole` is zero.
pub fn part_percent(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        None
    } else {
        Some(100.0 * part / whole)
    }
}

/// Estimated weekly traffic: downloads × installed size.
pub fn traffic(downloads_last_week: Option<u64>, size_bytes: u64) -> Option<u128> {
    downloads_last_week.map(|d| u128::from(d) * u128::from(size_bytes))
}

/// How one dependency relates to the package it belongs to.
///
/// Every figure derived from an unknown download count is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyShare {
    pub dependency: ResolvedDependency,
    pub installed_size_bytes: u64,
    pub subdependency_count: Option<u64>,
    pub downloads_last_week: Option<u64>,
    pub total_downloads: u64,
    pub traffic_last_week: Option<u128>,
    pub percent_downloads_of_version: Option<f64>,
    pub percent_of_package_size: Option<f64>,
    pub percent_of_package_subdependencies: Option<f64>,
    /// Traffic this dependency causes through installs of the package.
    pub traffic_from_package: Option<u128>,
    /// Share of the dependency's downloads that come from the package.
    pub percent_of_dependency_downloads: Option<f64>,
}

/// Direction of the estimated traffic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "bytes", rename_all = "snake_case")]
pub enum TrafficChange {
    NoChange,
    Saved(u128),
    Wasted(u128),
}

/// Size and traffic before and after a change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeDifference {
    pub old_size_bytes: u64,
    pub new_size_bytes: u64,
    /// New size as a percentage of the old size.
    pub percent_of_old_size: Option<f64>,
    pub downloads_last_week: Option<u64>,
    pub traffic_before: Option<u128>,
    pub traffic_after: Option<u128>,
    pub traffic_change: Option<TrafficChange>,
}

/// Aggregated view of a dependency change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffStatistics {
    pub baseline_size_bytes: u64,
    pub baseline_subdependency_count: Option<u64>,
    pub new_total_size_bytes: u64,
    pub new_subdependency_count: Option<u64>,
    /// Baseline size minus every removed dependency, the reference for added shares.
    pub size_without_removed_bytes: u64,
    pub removed: Vec<DependencyShare>,
    pub added: Vec<DependencyShare>,
    pub difference: SizeDifference,
}

/// DiffAggregator combines a baseline and per-dependency measurements.
///
/// Pure functions only; every measurement must be collected beforehand.
pub struct DiffAggregator;

impl DiffAggregator {
    /// Builds the full statistics for a change.
    ///
    /// An added and a removed entry with the same `name@version` cancel each
    /// other out in every total.
    pub fn aggregate(baseline: &MeasurementResult, entries: &[DiffEntry]) -> DiffStatistics {
        let new_total_size_bytes = Self::new_total_size(baseline, entries);
        let size_without_removed_bytes = Self::new_total_size(
            baseline,
            entries.iter().filter(|e| e.kind == ChangeKind::Removed),
        );

        let share_of = |kind: ChangeKind, reference_size: u64| -> Vec<DependencyShare> {
            entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| Self::share(&e.dependency, &e.measurement, baseline, reference_size))
                .collect()
        };

        DiffStatistics {
            baseline_size_bytes: baseline.installed_size_bytes,
            baseline_subdependency_count: baseline.subdependency_count,
            new_total_size_bytes,
            new_subdependency_count: Self::new_subdependency_count(baseline, entries),
            size_without_removed_bytes,
            removed: share_of(ChangeKind::Removed, baseline.installed_size_bytes),
            added: share_of(ChangeKind::Added, size_without_removed_bytes),
            difference: Self::size_difference(
                baseline.installed_size_bytes,
                new_total_size_bytes,
                baseline.downloads_last_week,
            ),
        }
    }

    /// `baseline − Σ removed + Σ added`, never below zero.
    pub fn new_total_size<'a, I>(baseline: &MeasurementResult, entries: I) -> u64
    where
        I: IntoIterator<Item = &'a DiffEntry>,
    {
        let total = entries
            .into_iter()
            .fold(i128::from(baseline.installed_size_bytes), |acc, entry| {
                let size = i128::from(entry.measurement.installed_size_bytes);
                match entry.kind {
                    ChangeKind::Added => acc + size,
                    ChangeKind::Removed => acc - size,
                }
            });

        clamp_to_u64(total)
    }

    /// Baseline count adjusted by each direct dependency plus its own
    /// sub-dependencies. Unknown as soon as any input count is unknown.
    pub fn new_subdependency_count(
        baseline: &MeasurementResult,
        entries: &[DiffEntry],
    ) -> Option<u64> {
        let mut total = i128::from(baseline.subdependency_count?);
        for entry in entries {
            let contribution = 1 + i128::from(entry.measurement.subdependency_count?);
            match entry.kind {
                ChangeKind::Added => total += contribution,
                ChangeKind::Removed => total -= contribution,
            }
        }
        Some(clamp_to_u64(total))
    }

    /// Compares two sizes, weighting traffic by the weekly downloads of the
    /// old version.
    pub fn size_difference(
        old_size_bytes: u64,
        new_size_bytes: u64,
        downloads_last_week: Option<u64>,
    ) -> SizeDifference {
        let traffic_before = traffic(downloads_last_week, old_size_bytes);
        let traffic_after = traffic(downloads_last_week, new_size_bytes);

        let traffic_change = traffic_before
            .zip(traffic_after)
            .map(|(before, after)| match before.cmp(&after) {
                std::cmp::Ordering::Equal => TrafficChange::NoChange,
                std::cmp::Ordering::Greater => TrafficChange::Saved(before - after),
                std::cmp::Ordering::Less => TrafficChange::Wasted(after - before),
            });

        SizeDifference {
            old_size_bytes,
            new_size_bytes,
            percent_of_old_size: part_percent(new_size_bytes as f64, old_size_bytes as f64),
            downloads_last_week,
            traffic_before,
            traffic_after,
            traffic_change,
        }
    }

    /// Share figures of one dependency relative to `package`.
    ///
    /// `reference_size` is the package size the size share is computed
    /// against.
    pub fn share(
        dependency: &ResolvedDependency,
        measurement: &MeasurementResult,
        package: &MeasurementResult,
        reference_size: u64,
    ) -> DependencyShare {
        let size = measurement.installed_size_bytes;

        let percent_of_package_subdependencies = measurement
            .subdependency_count
            .zip(package.subdependency_count)
            .and_then(|(part, whole)| part_percent(part as f64, whole as f64));

        let percent_of_dependency_downloads = package
            .downloads_last_week
            .zip(measurement.downloads_last_week)
            .and_then(|(package_dl, dep_dl)| part_percent(package_dl as f64, dep_dl as f64));

        DependencyShare {
            dependency: dependency.clone(),
            installed_size_bytes: size,
            subdependency_count: measurement.subdependency_count,
            downloads_last_week: measurement.downloads_last_week,
            total_downloads: measurement.total_downloads,
            traffic_last_week: traffic(measurement.downloads_last_week, size),
            percent_downloads_of_version: Self::percent_downloads_of_version(measurement),
            percent_of_package_size: part_percent(size as f64, reference_size as f64),
            percent_of_package_subdependencies,
            traffic_from_package: traffic(package.downloads_last_week, size),
            percent_of_dependency_downloads,
        }
    }

    /// Share of all downloads that went to the measured version.
    pub fn percent_downloads_of_version(measurement: &MeasurementResult) -> Option<f64> {
        measurement
            .downloads_last_week
            .and_then(|d| part_percent(d as f64, measurement.total_downloads as f64))
    }
}

fn clamp_to_u64(value: i128) -> u64 {
    u64::try_from(value.max(0)).unwrap_or(u64::MAX)
}
