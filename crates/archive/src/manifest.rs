//! Content manifest recorded inside every package

use pkgsig_errors::{Error, PackageError};
use pkgsig_hash::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Current manifest format version
pub const MANIFEST_VERSION: u32 = 1;

/// One recorded payload file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    /// Lowercase hex digest
    pub blake3: String,
    pub size: u64,
}

/// The list of payload files and their hashes; this is what gets signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentManifest {
    pub version: u32,
    /// Kept as text so an unknown algorithm can be reported instead of failing to parse
    pub algorithm: String,
    pub entries: Vec<ManifestEntry>,
}

impl ContentManifest {
    #[must_use]
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            algorithm: HashAlgorithm::Blake3.as_str().to_string(),
            entries,
        }
    }

    /// Parse manifest bytes
    ///
    /// # Errors
    /// Returns `PackageError::InvalidManifest` if the bytes are not a manifest.
    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(|e| {
            PackageError::InvalidManifest {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize to the exact bytes stored (and signed) in the archive
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// The declared hash algorithm, if supported
    #[must_use]
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_name(&self.algorithm)
    }

    #[must_use]
    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}
