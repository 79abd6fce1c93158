#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Signed package archives (.spkg)
//!
//! A package is a plain tar archive. Payload files live anywhere outside the
//! reserved `.signature/` directory, which holds the content manifest
//! (`manifest.json`, one BLAKE3 hash per payload file) and, for signed
//! packages, a minisign signature over the manifest bytes.

mod manifest;
mod reader;
mod writer;

pub use manifest::{ContentManifest, ManifestEntry, MANIFEST_VERSION};
pub use reader::{PackageArchiveReader, PackageEntry};
pub use writer::{create_package, embed_signature};

/// File extension of package archives
pub const PACKAGE_EXTENSION: &str = "spkg";

/// Directory holding signature material inside an archive
pub const SIGNATURE_DIR: &str = ".signature";

/// Archive path of the content manifest
pub const MANIFEST_PATH: &str = ".signature/manifest.json";

/// Archive path of the detached manifest signature
pub const SIGNATURE_PATH: &str = ".signature/manifest.json.minisig";

/// Whether `path` names a file with the package extension
#[must_use]
pub fn has_package_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

/// Normalize an archive member path to forward slashes without a leading `./`
pub(crate) fn normalize_entry_path(path: &std::path::Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
