use crate::measurement::domain::Lockfile;
use crate::ports::outbound::{SandboxArtifacts, INSTALL_DIR, LOCKFILE_NAME};
use crate::shared::error::SizeError;
use crate::shared::security::validate_regular_file;
use crate::shared::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// FileSystemArtifacts adapter reading install results from a sandbox directory
///
/// This adapter implements the SandboxArtifacts port. Only the
/// `node_modules` subtree is measured; the manifest and lockfile at the
/// sandbox root are not part of the installed size.
pub struct FileSystemArtifacts;

impl FileSystemArtifacts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemArtifacts {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxArtifacts for FileSystemArtifacts {
    fn installed_size(&self, sandbox_dir: &Path) -> Result<u64> {
        let install_dir = sandbox_dir.join(INSTALL_DIR);
        let mut total = 0u64;

        for entry in WalkDir::new(&install_dir) {
            let entry = entry.map_err(|e| SizeError::ArtifactRead {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| install_dir.clone()),
                details: e.to_string(),
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| SizeError::ArtifactRead {
                path: entry.path().to_path_buf(),
                details: e.to_string(),
            })?;
            total += metadata.len();
        }

        tracing::debug!(dir = %install_dir.display(), bytes = total, "Measured installed size");
        Ok(total)
    }

    fn read_lockfile(&self, sandbox_dir: &Path) -> Result<Lockfile> {
        let path = sandbox_dir.join(LOCKFILE_NAME);

        validate_regular_file(&path, LOCKFILE_NAME).map_err(|e| SizeError::ArtifactRead {
            path: path.clone(),
            details: e.to_string(),
        })?;

        let content = fs::read_to_string(&path).map_err(|e| SizeError::ArtifactRead {
            path: path.clone(),
            details: e.to_string(),
        })?;

        Lockfile::parse(&content, &path)
    }
}
