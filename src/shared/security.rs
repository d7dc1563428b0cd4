use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum lockfile size accepted from a sandbox (100 MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Characters that cannot appear in a directory name on every platform.
const UNSAFE_FILE_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces filesystem-unsafe characters with `_`.
///
/// `@types/node@20.1.0` becomes `@types_node@20.1.0`. Different inputs may
/// map to the same output, so callers append a random suffix when they need
/// uniqueness.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if UNSAFE_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Errors
/// Returns an error if:
/// - The path doesn't exist
/// - The path is a symbolic link
/// - The path is not a regular file
/// - The file exceeds [`MAX_FILE_SIZE`]
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read {} metadata at {}: {}",
            file_description,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, symbolic links are not allowed.",
            path.display()
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    if metadata.len() > MAX_FILE_SIZE {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            metadata.len(),
            MAX_FILE_SIZE
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_replaces_every_unsafe_character() {
        assert_eq!(
            sanitize_file_name(r#"a/b\c:d*e?f"g<h>i|j"#),
            "a_b_c_d_e_f_g_h_i_j"
        );
    }

    #[test]
    fn test_sanitize_scoped_package() {
        assert_eq!(sanitize_file_name("@scope/pkg@1.2.3"), "@scope_pkg@1.2.3");
    }

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_file_name("left-pad@1.3.0"), "left-pad@1.3.0");
    }

    #[test]
    fn test_validate_regular_file_accepts_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package-lock.json");
        fs::write(&path, "{}").unwrap();
        assert!(validate_regular_file(&path, "package-lock.json").is_ok());
    }

    #[test]
    fn test_validate_regular_file_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let result = validate_regular_file(dir.path(), "package-lock.json");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("is not a regular file"));
    }

    #[test]
    fn test_validate_regular_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = validate_regular_file(&dir.path().join("missing.json"), "lockfile");
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_regular_file_rejects_symlink() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("real.json");
        fs::write(&target, "{}").unwrap();
        let link = dir.path().join("link.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let result = validate_regular_file(&link, "lockfile");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("symbolic link"));
    }
}
