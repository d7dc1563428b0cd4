use semver::Version;
use std::collections::HashMap;

/// Weekly download counts of a package, per published version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Downloads {
    per_version: HashMap<String, u64>,
}

impl Downloads {
    pub fn new(per_version: HashMap<String, u64>) -> Self {
        Self { per_version }
    }

    /// Downloads of one version, `None` when the registry reported nothing.
    pub fn for_version(&self, version: &Version) -> Option<u64> {
        self.per_version.get(&version.to_string()).copied()
    }

    /// Downloads across every version.
    pub fn total(&self) -> u64 {
        self.per_version.values().sum()
    }
}

impl FromIterator<(String, u64)> for Downloads {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
