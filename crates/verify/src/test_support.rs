//! Package fixtures shared by the unit tests

use pkgsig_archive::{
    create_package, embed_signature, ContentManifest, ManifestEntry, PackageArchiveReader,
    MANIFEST_PATH, SIGNATURE_PATH,
};
use pkgsig_hash::Hash;
use pkgsig_signing::{generate_keypair, sign_bytes, KeyPair, TrustStore, TrustedKey};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) struct Fixture {
    dir: TempDir,
    pair: KeyPair,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            pair: generate_keypair().unwrap(),
        }
    }

    pub(crate) fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub(crate) fn public_key(&self) -> String {
        self.pair.public_key_base64()
    }

    pub(crate) fn key_id(&self) -> String {
        self.pair.key_id()
    }

    pub(crate) fn trust(&self) -> Arc<TrustStore> {
        let mut store = TrustStore::new();
        store.insert(TrustedKey::from_public_key(&self.public_key(), None).unwrap());
        Arc::new(store)
    }

    pub(crate) fn sign(&self, content: &[u8]) -> String {
        sign_bytes(&self.pair.secret_key, content, None).unwrap()
    }

    pub(crate) fn manifest_for(&self, files: &[(&str, &str)]) -> Vec<u8> {
        let entries = files
            .iter()
            .map(|(path, data)| ManifestEntry {
                path: (*path).to_string(),
                blake3: Hash::from_data(data.as_bytes()).to_hex(),
                size: data.len() as u64,
            })
            .collect();
        ContentManifest::new(entries).to_json().unwrap()
    }

    pub(crate) async fn unsigned_package(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let src = self.path(&format!("{name}.src"));
        for (path, data) in files {
            let target = src.join(path);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(target, data.as_bytes()).unwrap();
        }
        std::fs::create_dir_all(&src).unwrap();
        let out = self.path(&format!("{name}.spkg"));
        create_package(&src, &out).await.unwrap();
        out
    }

    pub(crate) async fn signed_package(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let out = self.unsigned_package(name, files).await;
        let manifest = {
            let reader = PackageArchiveReader::open(&out).await.unwrap();
            reader.manifest_bytes().unwrap().to_vec()
        };
        embed_signature(&out, &self.sign(&manifest), &out)
            .await
            .unwrap();
        out
    }
}

/// Write a package archive entry by entry, bypassing manifest generation
pub(crate) fn write_raw_package(
    path: &Path,
    files: &[(&str, &str)],
    manifest: Option<&[u8]>,
    signature: Option<&str>,
) {
    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(file);
    let mut append = |name: &str, data: &[u8]| {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, name, data).unwrap();
    };
    for (name, data) in files {
        append(name, data.as_bytes());
    }
    if let Some(manifest) = manifest {
        append(MANIFEST_PATH, manifest);
    }
    if let Some(signature) = signature {
        append(SIGNATURE_PATH, signature.as_bytes());
    }
    builder.finish().unwrap();
}
