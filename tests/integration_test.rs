/// Integration tests for the application layer
mod test_utilities;

use package_size::application::dto::Report;
use package_size::application::services::{FanOutCoordinator, LogSink};
use package_size::measurement::services::TrafficChange;
use package_size::prelude::*;
use package_size::shared::error::SizeError;
use semver::Version;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_utilities::mocks::*;

struct Harness {
    registry: Arc<MockRegistry>,
    runtime: Arc<MockContainerRuntime>,
    progress: MockProgressReporter,
    sandbox_root: TempDir,
    options: SandboxOptions,
}

impl Harness {
    fn new(registry: MockRegistry, runtime: MockContainerRuntime) -> Self {
        let sandbox_root = TempDir::new().unwrap();
        let options = SandboxOptions {
            log_sink: LogSink::Discard,
            install_timeout: Some(Duration::from_secs(10)),
            sandbox_root: Some(sandbox_root.path().to_path_buf()),
            ..Default::default()
        };
        Self {
            registry: Arc::new(registry),
            runtime: Arc::new(runtime),
            progress: MockProgressReporter::new(),
            sandbox_root,
            options,
        }
    }

    fn measurer(&self) -> PackageMeasurer<MockContainerRuntime, FileSystemArtifacts> {
        let executor = SandboxExecutor::new(Arc::clone(&self.runtime), self.options.clone());
        PackageMeasurer::new(executor, FileSystemArtifacts::new())
    }

    fn change_use_case(
        &self,
    ) -> EstimateDependencyChangeUseCase<
        MockRegistry,
        MockContainerRuntime,
        FileSystemArtifacts,
        MockProgressReporter,
    > {
        EstimateDependencyChangeUseCase::new(
            Arc::clone(&self.registry),
            self.measurer(),
            self.progress.clone(),
        )
    }

    fn sandbox_dirs_left(&self) -> usize {
        std::fs::read_dir(self.sandbox_root.path()).unwrap().count()
    }
}

fn dep(name: &str, version: &str) -> ResolvedDependency {
    ResolvedDependency::new(name, Version::parse(version).unwrap())
}

/// express 4.18.2 depending on debug and qs, plus left-pad on the side.
fn express_registry() -> MockRegistry {
    MockRegistry::new()
        .with_package("express", &["4.17.1", "4.18.2"], "4.18.2")
        .with_dependencies(
            "express",
            "4.18.2",
            &[("debug", "2.6.9"), ("qs", "~6.11.0")],
        )
        .with_package("debug", &["2.6.9", "4.3.4"], "4.3.4")
        .with_package("qs", &["6.11.0", "6.11.2", "6.12.0"], "6.12.0")
        .with_package("left-pad", &["1.2.0", "1.3.0"], "1.3.0")
        .with_downloads("express", &[("4.18.2", 750), ("4.17.1", 250)])
        .with_downloads("debug", &[("2.6.9", 4_000), ("4.3.4", 6_000)])
        .with_downloads("left-pad", &[("1.3.0", 100)])
}

fn express_installs() -> MockContainerRuntime {
    MockContainerRuntime::new()
        .with_install(
            "express@4.18.2",
            InstallFixture::new(10_000, 2)
                .with_locked("debug", "2.6.9")
                .with_locked("qs", "6.11.2"),
        )
        .with_install("debug@2.6.9", InstallFixture::new(2_000, 1))
        .with_install("qs@6.11.2", InstallFixture::new(3_000, 3))
        .with_install("left-pad@1.3.0", InstallFixture::new(500, 0))
}

#[tokio::test]
async fn test_resolve_dependencies_of_package() {
    let registry = Arc::new(
        express_registry().with_dependencies(
            "express",
            "4.18.2",
            &[
                ("qs", "~6.11.0"),
                ("debug", "2.6.9"),
                ("ghost", "^1.0.0"),
                ("local", "file:../local"),
            ],
        ),
    );
    let use_case = ResolveDependenciesUseCase::new(Arc::clone(&registry), 2);

    let report = use_case.execute("express@^4", false).await.unwrap();

    assert_eq!(report.package, dep("express", "4.18.2"));
    assert_eq!(
        report.resolved,
        vec![dep("debug", "2.6.9"), dep("qs", "6.11.2")]
    );
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].name, "ghost");
    assert_eq!(registry.catalog_requests("local"), 0);
}

#[tokio::test]
async fn test_resolve_specifier_errors_are_retryable() {
    let registry = Arc::new(express_registry());
    let use_case = ResolveDependenciesUseCase::new(registry, 2);

    let err = use_case.resolve_specifier("express@^9").await.unwrap_err();
    assert!(package_size::shared::error::is_retryable(&err));

    let err = use_case.resolve_specifier("").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SizeError>(),
        Some(SizeError::InvalidSpecifier { .. })
    ));
}

#[tokio::test]
async fn test_measure_package_snapshot() {
    let harness = Harness::new(express_registry(), express_installs());
    let use_case = harness.change_use_case();

    let snapshot = use_case
        .measure_package(&dep("express", "4.18.2"))
        .await
        .unwrap();

    assert_eq!(snapshot.measurement.installed_size_bytes, 10_000);
    assert_eq!(snapshot.measurement.subdependency_count, Some(4));
    assert_eq!(snapshot.measurement.downloads_last_week, Some(750));
    assert_eq!(snapshot.measurement.total_downloads, 1_000);
    assert_eq!(snapshot.percent_downloads_of_version, Some(75.0));
    assert_eq!(snapshot.traffic_last_week, Some(7_500_000));
    assert!(snapshot.latest.is_none());

    assert_eq!(harness.runtime.installs(), vec!["express@4.18.2"]);
    assert_eq!(harness.runtime.removed_count(), 1);
    assert_eq!(harness.sandbox_dirs_left(), 0);
}

#[tokio::test]
async fn test_older_version_reports_latest() {
    let runtime = MockContainerRuntime::new()
        .with_install("express@4.17.1", InstallFixture::new(9_000, 1));
    let harness = Harness::new(express_registry(), runtime);

    let snapshot = harness
        .change_use_case()
        .measure_package(&dep("express", "4.17.1"))
        .await
        .unwrap();

    let latest = snapshot.latest.unwrap();
    assert_eq!(latest.version, Version::new(4, 18, 2));
    assert_eq!(snapshot.measurement.downloads_last_week, Some(250));
}

#[tokio::test]
async fn test_fan_out_measures_each_dependency_once() {
    let harness = Harness::new(
        express_registry(),
        express_installs().with_install_delay(Duration::from_millis(20)),
    );
    let measurer = harness.measurer();
    let coordinator =
        FanOutCoordinator::new(harness.registry.as_ref(), &measurer, &harness.progress);

    let measured = coordinator
        .measure_all(&[
            dep("debug", "2.6.9"),
            dep("qs", "6.11.2"),
            dep("debug", "2.6.9"),
        ])
        .await
        .unwrap();

    assert_eq!(measured.len(), 2);
    assert_eq!(measured["debug@2.6.9"].installed_size_bytes, 2_000);
    assert_eq!(measured["debug@2.6.9"].subdependency_count, Some(1));
    assert_eq!(measured["qs@6.11.2"].subdependency_count, Some(3));
    // qs has no download counts
    assert_eq!(measured["qs@6.11.2"].downloads_last_week, None);
    assert_eq!(measured["qs@6.11.2"].total_downloads, 0);

    let mut installs = harness.runtime.installs();
    installs.sort();
    assert_eq!(installs, vec!["debug@2.6.9", "qs@6.11.2"]);
    assert_eq!(harness.progress.last_progress(), Some((2, 2)));
}

#[tokio::test]
async fn test_fan_out_fails_when_any_install_fails() {
    let harness = Harness::new(express_registry(), express_installs());
    let measurer = harness.measurer();
    let coordinator =
        FanOutCoordinator::new(harness.registry.as_ref(), &measurer, &harness.progress);

    let result = coordinator
        .measure_all(&[dep("debug", "2.6.9"), dep("debug", "4.3.4")])
        .await;

    assert!(result.is_err());
    // Both installs ran to completion and were cleaned up
    assert_eq!(harness.runtime.removed_count(), 2);
    assert_eq!(harness.sandbox_dirs_left(), 0);
}

#[tokio::test]
async fn test_dependency_without_lockfile_has_unknown_subdependencies() {
    let runtime = MockContainerRuntime::new()
        .with_install("left-pad@1.3.0", InstallFixture::new(500, 0).without_lockfile());
    let harness = Harness::new(express_registry(), runtime);
    let measurer = harness.measurer();
    let coordinator =
        FanOutCoordinator::new(harness.registry.as_ref(), &measurer, &harness.progress);

    let measured = coordinator
        .measure_one(&dep("left-pad", "1.3.0"))
        .await
        .unwrap();

    assert_eq!(measured.installed_size_bytes, 500);
    assert_eq!(measured.subdependency_count, None);
    assert_eq!(measured.downloads_last_week, Some(100));
}

#[tokio::test]
async fn test_package_without_lockfile_cannot_be_measured() {
    let runtime = MockContainerRuntime::new()
        .with_install("express@4.18.2", InstallFixture::new(10_000, 2).without_lockfile());
    let harness = Harness::new(express_registry(), runtime);

    let err = harness
        .change_use_case()
        .measure_package(&dep("express", "4.18.2"))
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Cannot count the dependencies of express@4.18.2"));
}

#[tokio::test]
async fn test_estimate_change_with_installed_removal_and_verification() {
    let runtime = express_installs().with_install(MANIFEST_INSTALL, InstallFixture::new(8_400, 3));
    let harness = Harness::new(express_registry(), runtime);
    let use_case = harness.change_use_case();

    let request = use_case
        .prepare_request(
            dep("express", "4.18.2"),
            &["debug".to_string()],
            &["left-pad@^1.3".to_string()],
            true,
        )
        .await
        .unwrap();
    assert!(request.baseline.is_some());
    assert_eq!(request.removed, vec![dep("debug", "2.6.9")]);
    assert_eq!(request.added, vec![dep("left-pad", "1.3.0")]);

    let report = use_case.execute(request).await.unwrap();
    let stats = &report.statistics;

    assert_eq!(stats.baseline_size_bytes, 10_000);
    assert_eq!(stats.size_without_removed_bytes, 8_000);
    assert_eq!(stats.new_total_size_bytes, 8_500);
    assert_eq!(stats.new_subdependency_count, Some(3));
    assert_eq!(stats.removed[0].percent_of_package_size, Some(20.0));
    assert_eq!(stats.added[0].percent_of_package_size, Some(6.25));
    assert_eq!(
        stats.difference.traffic_change,
        Some(TrafficChange::Saved(750 * 1_500))
    );

    let verified = report.verified.unwrap();
    assert_eq!(verified.installed_size_bytes, 8_400);
    assert_eq!(verified.package_count, Some(4));

    // The baseline is installed once, before the request was built
    let installs = harness.runtime.installs();
    assert_eq!(installs.iter().filter(|i| *i == "express@4.18.2").count(), 1);

    let manifests = harness.runtime.manifests.lock().unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&manifests[0]).unwrap();
    assert_eq!(manifest["dependencies"]["left-pad"], "1.3.0");
    assert!(manifest["dependencies"].get("debug").is_none());
    assert_eq!(manifest["dependencies"]["qs"], "~6.11.0");
}

#[tokio::test]
async fn test_add_and_remove_of_same_version_cancel_out() {
    let harness = Harness::new(express_registry(), express_installs());
    let use_case = harness.change_use_case();

    let request = use_case
        .prepare_request(
            dep("express", "4.18.2"),
            &["left-pad@1.3.0".to_string()],
            &["left-pad@^1".to_string(), "left-pad@1.3.0".to_string()],
            false,
        )
        .await
        .unwrap();
    assert!(request.baseline.is_none());

    let report = use_case.execute(request).await.unwrap();

    assert_eq!(report.statistics.new_total_size_bytes, 10_000);
    assert_eq!(report.statistics.new_subdependency_count, Some(4));
    assert_eq!(report.statistics.added.len(), 1);
    assert_eq!(
        report.statistics.difference.traffic_change,
        Some(TrafficChange::NoChange)
    );
    assert!(report.verified.is_none());

    let installs = harness.runtime.installs();
    assert_eq!(installs.iter().filter(|i| *i == "left-pad@1.3.0").count(), 1);
}

#[tokio::test]
async fn test_verify_install_skips_cancelled_pairs() {
    let runtime = express_installs().with_install(MANIFEST_INSTALL, InstallFixture::new(10_000, 4));
    let harness = Harness::new(express_registry(), runtime);
    let use_case = harness.change_use_case();

    let request = use_case
        .prepare_request(
            dep("express", "4.18.2"),
            &["left-pad@1.3.0".to_string()],
            &["left-pad@1.3.0".to_string()],
            true,
        )
        .await
        .unwrap();
    let report = use_case.execute(request).await.unwrap();

    assert_eq!(report.statistics.new_total_size_bytes, 10_000);
    assert_eq!(report.verified.unwrap().installed_size_bytes, 10_000);

    let manifests = harness.runtime.manifests.lock().unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&manifests[0]).unwrap();
    assert!(manifest["dependencies"].get("left-pad").is_none());
    assert_eq!(manifest["dependencies"]["debug"], "2.6.9");
}

#[tokio::test]
async fn test_removing_unknown_dependency_is_rejected() {
    let harness = Harness::new(express_registry(), express_installs());

    let err = harness
        .change_use_case()
        .prepare_request(dep("express", "4.18.2"), &["left-pad".to_string()], &[], false)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SizeError>(),
        Some(SizeError::InvalidSpecifier { .. })
    ));
}

#[tokio::test]
async fn test_compare_versions() {
    let registry = MockRegistry::new()
        .with_package("react", &["17.0.2", "18.2.0"], "18.2.0")
        .with_downloads("react", &[("17.0.2", 100), ("18.2.0", 300)]);
    let runtime = MockContainerRuntime::new()
        .with_install("react@17.0.2", InstallFixture::new(1_000, 2))
        .with_install("react@18.2.0", InstallFixture::new(1_500, 1));
    let harness = Harness::new(registry, runtime);
    let use_case = CompareVersionsUseCase::new(
        Arc::clone(&harness.registry),
        harness.measurer(),
        harness.progress.clone(),
    );

    let report = use_case.execute("react", "^17", "18.2.0").await.unwrap();

    assert_eq!(report.old.package, dep("react", "17.0.2"));
    assert_eq!(report.new.package, dep("react", "18.2.0"));
    assert_eq!(report.difference.old_size_bytes, 1_000);
    assert_eq!(report.difference.new_size_bytes, 1_500);
    assert_eq!(report.difference.percent_of_old_size, Some(150.0));
    assert_eq!(report.difference.downloads_last_week, Some(100));
    assert_eq!(
        report.difference.traffic_change,
        Some(TrafficChange::Wasted(50_000))
    );
    assert_eq!(report.subdependency_change, Some(-1));
    assert_eq!(harness.registry.catalog_requests("react"), 1);
}

#[tokio::test]
async fn test_measure_dependencies_batch() {
    let registry = express_registry().with_dependencies(
        "express",
        "4.18.2",
        &[("debug", "2.6.9"), ("qs", "~6.11.0"), ("ghost", "^1.0.0")],
    );
    let harness = Harness::new(registry, express_installs());
    let use_case = MeasureDependenciesUseCase::new(
        Arc::clone(&harness.registry),
        harness.measurer(),
        harness.progress.clone(),
        2,
    );

    let report = use_case
        .execute(&dep("express", "4.18.2"), false)
        .await
        .unwrap();

    assert_eq!(report.package.measurement.installed_size_bytes, 10_000);
    assert_eq!(report.dependencies.len(), 2);
    assert_eq!(report.total_dependency_size_bytes, 5_000);

    let debug = &report.dependencies[0];
    assert_eq!(debug.dependency, dep("debug", "2.6.9"));
    assert_eq!(debug.percent_of_package_size, Some(20.0));
    assert_eq!(debug.percent_of_package_subdependencies, Some(25.0));
    assert_eq!(debug.traffic_from_package, Some(750 * 2_000));
    assert_eq!(debug.percent_of_dependency_downloads, Some(18.75));

    let qs = &report.dependencies[1];
    assert_eq!(qs.downloads_last_week, None);
    assert_eq!(qs.percent_of_dependency_downloads, None);

    assert_eq!(report.unresolved.len(), 1);
    assert!(harness
        .progress
        .errors()
        .iter()
        .any(|e| e.contains("ghost")));
}

#[tokio::test]
async fn test_reports_render_in_both_formats() {
    let harness = Harness::new(express_registry(), express_installs());
    let snapshot = harness
        .change_use_case()
        .measure_package(&dep("express", "4.18.2"))
        .await
        .unwrap();
    let report = Report::Measure(snapshot);

    let json = JsonFormatter::new().format(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["kind"], "measure");
    assert_eq!(value["measurement"]["installed_size_bytes"], 10_000);

    let text = TextFormatter::with_color(false).format(&report).unwrap();
    assert!(text.contains("express@4.18.2"));
}
