//! Read-only view of a package archive

use pkgsig_errors::{Error, PackageError, StorageError};
use pkgsig_hash::Hash;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use crate::{normalize_entry_path, MANIFEST_PATH, SIGNATURE_DIR, SIGNATURE_PATH};

/// A payload file found in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub path: String,
    pub hash: Hash,
    pub size: u64,
}

/// An opened package
///
/// Opening reads the whole archive once: payload files are hashed, signature
/// material is kept in memory. The reader owns everything it read and
/// releases it on drop, so a package is only held for as long as the value
/// lives.
#[derive(Debug)]
pub struct PackageArchiveReader {
    path: PathBuf,
    entries: Vec<PackageEntry>,
    manifest: Option<Vec<u8>>,
    signature: Option<String>,
}

impl PackageArchiveReader {
    /// Open and index a package archive
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The tar stream is corrupted
    /// - An entry path escapes the archive root or appears twice
    /// - The signature entry is not UTF-8
    pub async fn open(path: &Path) -> Result<Self, Error> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::open_blocking(path))
            .await
            .map_err(|e| Error::internal(format!("archive read task failed: {e}")))?
    }

    fn open_blocking(path: PathBuf) -> Result<Self, Error> {
        let file = File::open(&path).map_err(|e| StorageError::from_io_with_path(&e, &path))?;
        let mut archive = Archive::new(BufReader::new(file));

        let corrupted = |e: std::io::Error| -> Error {
            PackageError::Corrupted {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        };

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut manifest = None;
        let mut signature = None;

        for entry in archive.entries().map_err(corrupted)? {
            let mut entry = entry.map_err(corrupted)?;
            let raw_path = entry.path().map_err(corrupted)?.into_owned();

            // Security check: ensure path doesn't escape the archive root
            if raw_path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
            {
                return Err(PackageError::InvalidFormat {
                    message: format!("archive contains unsafe path {}", raw_path.display()),
                }
                .into());
            }

            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = normalize_entry_path(&raw_path);
            if !seen.insert(name.clone()) {
                return Err(PackageError::InvalidFormat {
                    message: format!("archive contains duplicate entry {name}"),
                }
                .into());
            }

            if name == MANIFEST_PATH {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes).map_err(corrupted)?;
                manifest = Some(bytes);
            } else if name == SIGNATURE_PATH {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes).map_err(corrupted)?;
                let text = String::from_utf8(bytes).map_err(|_| PackageError::InvalidFormat {
                    message: "signature entry is not UTF-8".to_string(),
                })?;
                signature = Some(text);
            } else if name
                .strip_prefix(SIGNATURE_DIR)
                .is_some_and(|rest| rest.starts_with('/'))
            {
                tracing::trace!(entry = %name, "ignoring reserved entry");
            } else {
                let (hash, size) = Hash::hash_reader(&mut entry)?;
                entries.push(PackageEntry {
                    path: name,
                    hash,
                    size,
                });
            }
        }

        tracing::debug!(
            package = %path.display(),
            entries = entries.len(),
            signed = signature.is_some(),
            "opened package archive"
        );

        Ok(Self {
            path,
            entries,
            manifest,
            signature,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload files in archive order
    #[must_use]
    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, path: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// A package is signed when it carries a manifest signature
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    #[must_use]
    pub fn manifest_bytes(&self) -> Option<&[u8]> {
        self.manifest.as_deref()
    }

    #[must_use]
    pub fn signature_text(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}
