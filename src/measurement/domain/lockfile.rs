use crate::shared::error::SizeError;
use crate::shared::Result;
use indexmap::IndexMap;
use semver::Version;
use serde::Deserialize;
use std::path::Path;

/// The only lockfile format the measurer understands.
pub const SUPPORTED_LOCKFILE_VERSION: i64 = 3;

const NESTED_MODULES_PREFIX: &str = "node_modules/";

/// An entry of the `packages` section of a v3 lockfile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockedPackage {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dev: bool,
}

/// A parsed `package-lock.json` (format version 3).
///
/// Package paths are stored without their leading `node_modules/`, so a
/// top-level install is keyed by its bare package name and the root
/// project by the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    packages: IndexMap<String, LockedPackage>,
}

#[derive(Deserialize)]
struct LockfileHeader {
    #[serde(rename = "lockfileVersion")]
    lockfile_version: i64,
}

#[derive(Deserialize)]
struct LockfileBody {
    #[serde(default)]
    packages: IndexMap<String, LockedPackage>,
}

impl Lockfile {
    /// Parses lockfile JSON. `path` is only used in error messages.
    ///
    /// # Errors
    /// - [`SizeError::LockfileParse`] for malformed JSON or a missing version
    /// - [`SizeError::UnsupportedLockfileVersion`] for any version other than 3,
    ///   whatever the `packages` section contains
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let parse_error = |e: serde_json::Error| SizeError::LockfileParse {
            path: path.to_path_buf(),
            details: e.to_string(),
        };

        let header: LockfileHeader = serde_json::from_str(content).map_err(parse_error)?;
        if header.lockfile_version != SUPPORTED_LOCKFILE_VERSION {
            return Err(SizeError::UnsupportedLockfileVersion {
                version: header.lockfile_version,
            }
            .into());
        }

        let body: LockfileBody = serde_json::from_str(content).map_err(parse_error)?;
        let packages = body
            .packages
            .into_iter()
            .map(|(path, pkg)| {
                let key = path
                    .strip_prefix(NESTED_MODULES_PREFIX)
                    .map(str::to_string)
                    .unwrap_or(path);
                (key, pkg)
            })
            .collect();

        Ok(Self { packages })
    }

    /// Number of entries, the root project included.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Packages installed besides the root entry.
    pub fn subdependency_count(&self) -> u64 {
        (self.packages.len() as u64).saturating_sub(1)
    }

    pub fn get(&self, name: &str) -> Option<&LockedPackage> {
        self.packages.get(name)
    }

    /// Version of a top-level installed package, if the lockfile records a
    /// valid one.
    pub fn installed_version(&self, name: &str) -> Option<Version> {
        self.get(name)
            .and_then(|pkg| pkg.version.as_deref())
            .and_then(|v| Version::parse(v).ok())
    }
}
