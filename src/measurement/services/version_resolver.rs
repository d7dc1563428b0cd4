use super::version_range::NpmRange;
use crate::measurement::domain::{
    CatalogVersion, DependencySpecifier, ResolvedDependency, VersionCatalog,
};
use crate::shared::error::SizeError;
use crate::shared::Result;

/// VersionResolver picks one concrete version out of a catalog.
///
/// This service contains pure business logic. The catalog must already be
/// fetched; no registry access happens here.
pub struct VersionResolver;

impl VersionResolver {
    /// Resolves a parsed specifier against the catalog of its package.
    ///
    /// # Arguments
    /// * `specifier` - Package name with an optional npm range
    /// * `catalog` - Catalog of the same package
    ///
    /// # Returns
    /// The `latest` version when no constraint is given, otherwise the
    /// highest version satisfying the constraint
    ///
    /// # Errors
    /// - [`SizeError::InvalidConstraint`] for unparseable range text
    /// - [`SizeError::NoMatchingVersion`] when nothing satisfies the range
    /// - [`SizeError::NoLatestVersion`] when the catalog has no usable `latest`
    pub fn resolve(
        specifier: &DependencySpecifier,
        catalog: &VersionCatalog,
    ) -> Result<ResolvedDependency> {
        let entry = Self::resolve_entry(specifier.name(), specifier.constraint(), catalog)?;
        Ok(ResolvedDependency::new(specifier.name(), entry.version.clone()))
    }

    /// Parses `input` and resolves it in one step.
    pub fn resolve_str(input: &str, catalog: &VersionCatalog) -> Result<ResolvedDependency> {
        let specifier = DependencySpecifier::parse(input)?;
        Self::resolve(&specifier, catalog)
    }

    /// Same as [`resolve`](Self::resolve) but returns the whole catalog entry
    /// (release time and manifest included).
    pub fn resolve_entry<'a>(
        name: &str,
        constraint: Option<&str>,
        catalog: &'a VersionCatalog,
    ) -> Result<&'a CatalogVersion> {
        let Some(constraint) = constraint else {
            return catalog.latest().ok_or_else(|| {
                SizeError::NoLatestVersion {
                    name: name.to_string(),
                }
                .into()
            });
        };

        let range = NpmRange::parse(constraint).map_err(|details| SizeError::InvalidConstraint {
            name: name.to_string(),
            constraint: constraint.to_string(),
            details,
        })?;

        Self::best_match(catalog, &range).ok_or_else(|| {
            SizeError::NoMatchingVersion {
                name: name.to_string(),
                constraint: constraint.to_string(),
            }
            .into()
        })
    }

    /// Highest version in the catalog satisfying `range`.
    pub fn best_match<'a>(
        catalog: &'a VersionCatalog,
        range: &NpmRange,
    ) -> Option<&'a CatalogVersion> {
        catalog
            .versions_descending()
            .find(|entry| range.matches(&entry.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::domain::catalog::test_support::catalog;
    use semver::Version;

    #[test]
    fn test_resolution_prefers_highest_match() {
        let catalog = catalog("foo", &["1.0.0", "1.2.0", "1.2.5", "2.0.0"], "2.0.0");
        let resolved = VersionResolver::resolve_str("foo@^1.0.0", &catalog).unwrap();
        assert_eq!(resolved.version, Version::new(1, 2, 5));
    }

    #[test]
    fn test_no_constraint_uses_latest_tag() {
        // latest deliberately not the highest version
        let catalog = catalog("foo", &["1.0.0", "2.0.0", "3.0.0-beta.1"], "1.0.0");
        let resolved = VersionResolver::resolve_str("foo", &catalog).unwrap();
        assert_eq!(resolved.version, Version::new(1, 0, 0));
        assert_eq!(resolved.key(), "foo@1.0.0");
    }

    #[test]
    fn test_space_form_resolves_like_at_form() {
        let catalog = catalog("foo", &["1.0.0", "1.2.0", "2.0.0"], "2.0.0");
        assert_eq!(
            VersionResolver::resolve_str("foo ~1.0", &catalog).unwrap(),
            VersionResolver::resolve_str("foo@~1.0", &catalog).unwrap()
        );
    }

    #[test]
    fn test_scoped_package() {
        let catalog = catalog("@scope/foo", &["1.2.3", "1.3.0"], "1.3.0");
        let resolved = VersionResolver::resolve_str("@scope/foo@1.2.3", &catalog).unwrap();
        assert_eq!(resolved.name, "@scope/foo");
        assert_eq!(resolved.version, Version::new(1, 2, 3));
    }

    #[test]
    fn test_no_match_is_retryable() {
        let catalog = catalog("foo", &["1.0.0", "2.0.0"], "2.0.0");
        let err = VersionResolver::resolve_str("foo@^3.0.0", &catalog).unwrap_err();
        let size_err = err.downcast_ref::<SizeError>().unwrap();
        assert!(matches!(size_err, SizeError::NoMatchingVersion { .. }));
        assert!(size_err.is_retryable());
    }

    #[test]
    fn test_invalid_constraint_is_retryable() {
        let catalog = catalog("foo", &["1.0.0"], "1.0.0");
        let err = VersionResolver::resolve_str("foo@not-a-range!!!", &catalog).unwrap_err();
        let size_err = err.downcast_ref::<SizeError>().unwrap();
        assert!(matches!(size_err, SizeError::InvalidConstraint { .. }));
        assert!(size_err.is_retryable());
    }

    #[test]
    fn test_missing_latest() {
        let mut catalog = catalog("foo", &["1.0.0"], "1.0.0");
        catalog.set_latest(Version::new(5, 0, 0));
        let err = VersionResolver::resolve_str("foo", &catalog).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SizeError>(),
            Some(SizeError::NoLatestVersion { .. })
        ));
    }

    #[test]
    fn test_or_range_picks_highest_alternative() {
        let catalog = catalog("foo", &["1.5.0", "2.5.0", "3.0.0"], "3.0.0");
        let resolved = VersionResolver::resolve_str("foo ^1.0.0 || ^2.0.0", &catalog).unwrap();
        assert_eq!(resolved.version, Version::new(2, 5, 0));
    }
}
