use super::dependency::ResolvedDependency;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A dependency entry as written in a `package.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDependency {
    pub name: String,
    pub constraint: String,
}

/// The parts of a `package.json` the engine reads and writes.
///
/// Dependency maps keep their declaration order. Entries that are not
/// strings, or maps that are not objects, are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(
        default,
        deserialize_with = "lenient_dependencies",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub dependencies: IndexMap<String, String>,
    #[serde(
        rename = "devDependencies",
        default,
        deserialize_with = "lenient_dependencies",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub dev_dependencies: IndexMap<String, String>,
}

impl PackageManifest {
    /// Dependencies whose constraint can be evaluated as a version range.
    ///
    /// Dist-tags, git URLs, `file:`/`workspace:` references and empty
    /// constraints are dropped here rather than failing the whole manifest.
    pub fn resolvable_dependencies(&self, include_dev: bool) -> Vec<ManifestDependency> {
        let dev = include_dev.then_some(&self.dev_dependencies);

        self.dependencies
            .iter()
            .chain(dev.into_iter().flatten())
            .filter(|(_, constraint)| is_resolvable_constraint(constraint))
            .map(|(name, constraint)| ManifestDependency {
                name: name.clone(),
                constraint: constraint.clone(),
            })
            .collect()
    }

    /// Builds the manifest installed to check an edited dependency set.
    ///
    /// Removed names are dropped, added dependencies are pinned to their
    /// resolved version and dev dependencies are not carried over. A
    /// dependency both added and removed at the same version is left as it
    /// was.
    pub fn with_changes(
        &self,
        added: &[ResolvedDependency],
        removed: &[ResolvedDependency],
    ) -> PackageManifest {
        let cancelled = |dep: &ResolvedDependency| {
            added.iter().any(|a| a.key() == dep.key())
                && removed.iter().any(|r| r.key() == dep.key())
        };

        let mut dependencies: IndexMap<String, String> = self
            .dependencies
            .iter()
            .filter(|(name, _)| !removed.iter().any(|r| &r.name == *name && !cancelled(r)))
            .map(|(name, constraint)| (name.clone(), constraint.clone()))
            .collect();

        for dep in added.iter().filter(|dep| !cancelled(dep)) {
            dependencies.insert(dep.name.clone(), dep.version.to_string());
        }

        PackageManifest {
            name: self.name.clone(),
            version: self.version.clone(),
            dependencies,
            dev_dependencies: IndexMap::new(),
        }
    }
}

/// True when a constraint starts like a version or a range operator.
pub fn is_resolvable_constraint(constraint: &str) -> bool {
    constraint
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '^' | '~' | '>' | '<' | '=' | '*'))
}

fn lenient_dependencies<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDependencies {
        Map(IndexMap<String, serde_json::Value>),
        Other(serde::de::IgnoredAny),
    }

    let RawDependencies::Map(map) = RawDependencies::deserialize(deserializer)? else {
        return Ok(IndexMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(name, constraint)| match constraint {
            serde_json::Value::String(c) => Some((name, c)),
            _ => None,
        })
        .collect())
}
