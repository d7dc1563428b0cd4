use super::PackageSnapshot;
use crate::measurement::domain::ResolvedDependency;

/// ChangeRequest - Internal request DTO for the change estimation use case
///
/// `removed` and `added` are already resolved. When `baseline` is `None`
/// the package is measured as part of the run.
#[derive(Debug, Clone)]
pub struct ChangeRequest {
    /// The package whose dependencies are being edited
    pub package: ResolvedDependency,
    /// A snapshot measured earlier, reused instead of a new install
    pub baseline: Option<PackageSnapshot>,
    pub removed: Vec<ResolvedDependency>,
    pub added: Vec<ResolvedDependency>,
    /// Also install the edited manifest to check the estimate
    pub verify: bool,
}

impl ChangeRequest {
    pub fn new(
        package: ResolvedDependency,
        removed: Vec<ResolvedDependency>,
        added: Vec<ResolvedDependency>,
    ) -> Self {
        Self {
            package,
            baseline: None,
            removed,
            added,
            verify: false,
        }
    }

    pub fn with_baseline(mut self, baseline: PackageSnapshot) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
