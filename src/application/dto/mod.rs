/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod change_request;
mod output_format;
mod reports;

pub use change_request::ChangeRequest;
pub use output_format::OutputFormat;
pub use reports::{
    BatchReport, ChangeReport, LatestVersion, PackageSnapshot, Report, ResolutionReport,
    UnresolvedDependency, VerifiedInstall, VersionComparisonReport,
};
