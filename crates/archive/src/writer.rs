//! Package creation and signature embedding

use pkgsig_errors::{Error, PackageError, StorageError};
use pkgsig_hash::Hash;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header, HeaderMode};

use crate::manifest::{ContentManifest, ManifestEntry};
use crate::{normalize_entry_path, MANIFEST_PATH, SIGNATURE_DIR, SIGNATURE_PATH};

/// Create an unsigned package from every regular file under `src`
///
/// Files are stored in sorted order and the manifest records their hashes.
/// Returns the manifest that was written.
///
/// # Errors
///
/// Returns an error if:
/// - `src` is not a directory or already contains a `.signature` directory
/// - Reading a file or writing the archive fails
pub async fn create_package(src: &Path, out: &Path) -> Result<ContentManifest, Error> {
    let src = src.to_path_buf();
    let out = out.to_path_buf();

    tokio::task::spawn_blocking(move || create_package_blocking(&src, &out))
        .await
        .map_err(|e| Error::internal(format!("create task failed: {e}")))?
}

fn create_package_blocking(src: &Path, out: &Path) -> Result<ContentManifest, Error> {
    if !src.is_dir() {
        return Err(StorageError::PathNotFound {
            path: src.display().to_string(),
        }
        .into());
    }
    if src.join(SIGNATURE_DIR).exists() {
        return Err(PackageError::InvalidFormat {
            message: format!("source directory must not contain {SIGNATURE_DIR}"),
        }
        .into());
    }

    let mut files = Vec::new();
    collect_files(src, src, &mut files)?;
    files.sort();

    let mut manifest_entries = Vec::with_capacity(files.len());
    for (name, path) in &files {
        let file = File::open(path).map_err(|e| StorageError::from_io_with_path(&e, path))?;
        let (hash, size) = Hash::hash_reader(BufReader::new(file))?;
        manifest_entries.push(ManifestEntry {
            path: name.clone(),
            blake3: hash.to_hex(),
            size,
        });
    }
    let manifest = ContentManifest::new(manifest_entries);
    let manifest_bytes = manifest.to_json()?;

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(out).map_err(|e| StorageError::from_io_with_path(&e, out))?;
    let mut builder = Builder::new(BufWriter::new(file));
    builder.mode(HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    for (name, path) in &files {
        builder.append_path_with_name(path, name)?;
    }
    append_bytes(&mut builder, MANIFEST_PATH, &manifest_bytes)?;

    builder.into_inner()?.into_inner().map_err(|e| e.into_error())?;
    Ok(manifest)
}

/// Recursively collect regular files as (archive name, filesystem path)
fn collect_files(
    root: &Path,
    dir: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), Error> {
    let entries = std::fs::read_dir(dir).map_err(|e| StorageError::from_io_with_path(&e, dir))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            collect_files(root, &path, files)?;
        } else if file_type.is_file() {
            let relative = path.strip_prefix(root).map_err(|_| StorageError::InvalidPath {
                path: path.display().to_string(),
            })?;
            files.push((normalize_entry_path(relative), path));
        }
    }

    Ok(())
}

fn append_bytes<W: std::io::Write>(
    builder: &mut Builder<W>,
    name: &str,
    bytes: &[u8],
) -> Result<(), Error> {
    let mut header = Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut header, name, bytes)?;
    Ok(())
}

/// Copy `package` to `out`, adding or replacing its manifest signature
///
/// `out` may be the same path as `package`; the archive is rewritten through
/// a temporary file in the destination directory.
///
/// # Errors
///
/// Returns an error if the source archive cannot be read or the destination
/// cannot be written.
pub async fn embed_signature(package: &Path, signature: &str, out: &Path) -> Result<(), Error> {
    let package = package.to_path_buf();
    let out = out.to_path_buf();
    let signature = signature.to_string();

    tokio::task::spawn_blocking(move || embed_signature_blocking(&package, &signature, &out))
        .await
        .map_err(|e| Error::internal(format!("sign task failed: {e}")))?
}

fn embed_signature_blocking(package: &Path, signature: &str, out: &Path) -> Result<(), Error> {
    let source =
        File::open(package).map_err(|e| StorageError::from_io_with_path(&e, package))?;
    let mut archive = Archive::new(BufReader::new(source));

    let dir = match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let temp = tempfile::NamedTempFile::new_in(&dir)?;
    let mut builder = Builder::new(BufWriter::new(temp.reopen()?));
    builder.mode(HeaderMode::Deterministic);

    let corrupted = |e: std::io::Error| -> Error {
        PackageError::Corrupted {
            message: format!("{}: {e}", package.display()),
        }
        .into()
    };

    for entry in archive.entries().map_err(corrupted)? {
        let mut entry = entry.map_err(corrupted)?;
        let kind = entry.header().entry_type();
        if kind.is_pax_global_extensions() || kind.is_pax_local_extensions() {
            continue;
        }
        let name = normalize_entry_path(&entry.path().map_err(corrupted)?);
        if name == SIGNATURE_PATH {
            continue;
        }
        let mut header = entry.header().clone();
        builder.append_data(&mut header, &name, &mut entry)?;
    }
    append_bytes(&mut builder, SIGNATURE_PATH, signature.as_bytes())?;
    builder.into_inner()?.into_inner().map_err(|e| e.into_error())?;
    drop(archive);

    temp.persist(out)
        .map_err(|e| StorageError::from_io_with_path(&e.error, out))?;
    Ok(())
}
