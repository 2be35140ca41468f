//! Destination checks performed before any network access.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::constants::{TEMP_FILE_PREFIX, TEMP_FILE_SUFFIX};
use super::error::UnexpectedError;

/// Result of the pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// Destination already holds a non-empty file; nothing to fetch.
    ShortCircuit(PathBuf),
    /// Destination is prepared (parent directory exists); fetch into it.
    Proceed(PathBuf),
}

impl Preflight {
    /// The resolved destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::ShortCircuit(path) | Self::Proceed(path) => path,
        }
    }
}

/// Resolves the destination and prepares it for writing.
///
/// When `local_path` is `None` a unique file is reserved in `temp_dir` (or the
/// OS temp directory). An existing non-empty file at the destination
/// short-circuits the fetch. Otherwise the parent directory is created.
///
/// # Errors
///
/// Returns [`UnexpectedError::Destination`] if the temporary file cannot be
/// reserved or the parent directory cannot be created.
pub async fn check(
    local_path: Option<&Path>,
    temp_dir: Option<&Path>,
) -> Result<Preflight, UnexpectedError> {
    let path = match local_path {
        Some(path) => path.to_path_buf(),
        None => reserve_temp_path(temp_dir).await?,
    };

    if let Ok(meta) = tokio::fs::metadata(&path).await
        && meta.is_file()
        && meta.len() > 0
    {
        debug!(path = %path.display(), bytes = meta.len(), "destination already populated");
        return Ok(Preflight::ShortCircuit(path));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| UnexpectedError::destination(parent, e))?;
    }

    Ok(Preflight::Proceed(path))
}

/// Reserves a fresh, empty file and returns its path.
///
/// The file is kept on disk so the name cannot be handed out twice.
async fn reserve_temp_path(temp_dir: Option<&Path>) -> Result<PathBuf, UnexpectedError> {
    let dir = temp_dir.map_or_else(std::env::temp_dir, Path::to_path_buf);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| UnexpectedError::destination(&dir, e))?;

    let path = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(TEMP_FILE_SUFFIX)
        .tempfile_in(&dir)
        .map_err(|e| UnexpectedError::destination(&dir, e))?
        .into_temp_path()
        .keep()
        .map_err(|e| UnexpectedError::destination(&dir, e.error))?;

    debug!(path = %path.display(), "generated temporary destination");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_existing_non_empty_file_short_circuits() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("done.bin");
        std::fs::write(&path, vec![7u8; 100]).unwrap();

        let result = check(Some(&path), None).await.unwrap();
        assert_eq!(result, Preflight::ShortCircuit(path));
    }

    #[tokio::test]
    async fn test_existing_empty_file_proceeds() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let result = check(Some(&path), None).await.unwrap();
        assert_eq!(result, Preflight::Proceed(path));
    }

    #[tokio::test]
    async fn test_missing_parent_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("c.bin");

        let result = check(Some(&path), None).await.unwrap();
        assert_eq!(result.path(), path.as_path());
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists(), "check must not create the file itself");
    }

    #[tokio::test]
    async fn test_generated_paths_are_unique_and_in_temp_dir() {
        let temp_dir = TempDir::new().unwrap();

        let first = check(None, Some(temp_dir.path())).await.unwrap();
        let second = check(None, Some(temp_dir.path())).await.unwrap();

        assert!(matches!(first, Preflight::Proceed(_)));
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(temp_dir.path()));
        let name = first.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(TEMP_FILE_PREFIX), "got: {name}");
        assert!(name.ends_with(TEMP_FILE_SUFFIX), "got: {name}");
    }

    #[tokio::test]
    async fn test_generated_temp_dir_is_created_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("scratch");

        let result = check(None, Some(&nested)).await.unwrap();
        assert!(result.path().starts_with(&nested));
    }

    #[tokio::test]
    async fn test_parent_is_a_file_reports_destination_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("child.bin");

        let result = check(Some(&path), None).await;
        assert!(
            matches!(result, Err(UnexpectedError::Destination { .. })),
            "got: {result:?}"
        );
    }
}
