/// Use cases module containing application business logic orchestration
mod compare_versions;
mod estimate_dependency_change;
mod measure_dependencies;
mod resolve_dependencies;

pub use compare_versions::CompareVersionsUseCase;
pub use estimate_dependency_change::EstimateDependencyChangeUseCase;
pub use measure_dependencies::MeasureDependenciesUseCase;
pub use resolve_dependencies::{ResolveDependenciesUseCase, DEFAULT_RESOLVER_WORKERS};
