#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! BLAKE3 content hashing for pkgsig
//!
//! Package manifests record one hash per payload entry; the integrity check
//! recomputes them with the helpers in this crate.

use pkgsig_errors::{Error, StorageError};
use std::fmt;
use std::io::Read;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hash algorithms a content manifest may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Blake3,
}

impl HashAlgorithm {
    /// Manifest name of the algorithm
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
        }
    }

    /// Look up an algorithm by its manifest name, ignoring case
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.eq_ignore_ascii_case("blake3").then_some(Self::Blake3)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32 byte BLAKE3 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; 32]);

impl Hash {
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64 character hex digest
    ///
    /// # Errors
    /// Returns `StorageError::CorruptedData` for anything else.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| StorageError::CorruptedData {
            message: format!("invalid digest {s:?}: {e}"),
        })?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash everything `reader` yields, returning the digest and byte count
    ///
    /// # Errors
    /// Returns an error if reading fails.
    pub fn hash_reader<R: Read>(mut reader: R) -> Result<(Self, u64), Error> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((Self(*hasher.finalize().as_bytes()), total))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
