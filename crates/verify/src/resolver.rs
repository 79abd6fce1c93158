//! Input path to package list

use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use pkgsig_archive::has_package_extension;
use pkgsig_errors::{Error, PackageError, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Turns the user's input path into the packages to verify
#[async_trait]
pub trait PackageResolver: Send + Sync {
    /// Packages named by `input`, in verification order
    async fn resolve(&self, input: &str) -> Result<Vec<PathBuf>, Error>;
}

/// Resolves files, directories and file name wildcards on the local disk
///
/// - an existing file resolves to itself
/// - a directory resolves to the `.spkg` files directly inside it
/// - a last component containing `*` or `?` resolves to the matching `.spkg`
///   files in its parent directory
///
/// Directory and wildcard results are sorted by file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPackageResolver;

impl LocalPackageResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn list_packages(
        dir: &Path,
        pattern: Option<&GlobMatcher>,
    ) -> Result<Vec<PathBuf>, Error> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, dir))?;

        let mut packages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !has_package_extension(&path)
                || !pattern.is_none_or(|m| m.is_match(entry.file_name()))
            {
                continue;
            }
            // Follows symlinks, like a directly named package
            let metadata = fs::metadata(&path)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &path))?;
            if metadata.is_file() {
                packages.push(path);
            }
        }

        packages.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(packages)
    }
}

#[async_trait]
impl PackageResolver for LocalPackageResolver {
    async fn resolve(&self, input: &str) -> Result<Vec<PathBuf>, Error> {
        let path = PathBuf::from(input);

        if let Ok(metadata) = fs::metadata(&path).await {
            if metadata.is_dir() {
                return Self::list_packages(&path, None).await;
            }
            return Ok(vec![path]);
        }

        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        if let Some(pattern) = file_name.filter(|n| n.contains(['*', '?'])) {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let matcher = Glob::new(&pattern)
                .map_err(|e| PackageError::InvalidFormat {
                    message: format!("invalid package pattern '{pattern}': {e}"),
                })?
                .compile_matcher();
            return Self::list_packages(&parent, Some(&matcher)).await;
        }

        Err(PackageError::NotFound {
            name: input.to_string(),
        }
        .into())
    }
}
