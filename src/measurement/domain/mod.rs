pub mod catalog;
pub mod dependency;
pub mod downloads;
pub mod lockfile;
pub mod manifest;
pub mod measurement;
pub mod specifier;

pub use catalog::{CatalogVersion, VersionCatalog};
pub use dependency::{ChangeKind, ResolvedDependency};
pub use downloads::Downloads;
pub use lockfile::{LockedPackage, Lockfile};
pub use manifest::{ManifestDependency, PackageManifest};
pub use measurement::{DiffEntry, MeasurementResult};
pub use specifier::DependencySpecifier;
