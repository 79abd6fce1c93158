//! Integration tests for package archives

use pkgsig_archive::{
    create_package, embed_signature, has_package_extension, ContentManifest,
    PackageArchiveReader, MANIFEST_PATH, SIGNATURE_PATH,
};
use pkgsig_errors::{Error, PackageError};
use std::path::Path;
use tempfile::TempDir;

fn write_tar(path: &Path, files: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(file);
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_bytes()).unwrap();
    }
    builder.finish().unwrap();
}

#[tokio::test]
async fn test_pack_and_read_back() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("payload");
    std::fs::create_dir_all(src.join("lib")).unwrap();
    std::fs::write(src.join("lib/libfoo.so"), vec![7u8; 4096]).unwrap();
    std::fs::write(src.join("VERSION"), b"1.2.3\n").unwrap();

    let pkg = temp.path().join("foo.spkg");
    let manifest = create_package(&src, &pkg).await.unwrap();
    assert_eq!(manifest.entries.len(), 2);

    let reader = PackageArchiveReader::open(&pkg).await.unwrap();
    assert_eq!(reader.path(), pkg.as_path());
    assert_eq!(reader.entries().len(), 2);
    assert_eq!(reader.entry("lib/libfoo.so").unwrap().size, 4096);
    assert!(reader.entry(MANIFEST_PATH).is_none());

    let parsed = ContentManifest::from_json(reader.manifest_bytes().unwrap()).unwrap();
    assert_eq!(parsed, manifest);
}

#[tokio::test]
async fn test_signed_iff_signature_entry_present() {
    let temp = TempDir::new().unwrap();
    let unsigned = temp.path().join("unsigned.spkg");
    write_tar(&unsigned, &[("a.txt", "a"), (MANIFEST_PATH, "{}")]);
    let reader = PackageArchiveReader::open(&unsigned).await.unwrap();
    assert!(!reader.is_signed());
    assert!(reader.manifest_bytes().is_some());

    let signed = temp.path().join("signed.spkg");
    embed_signature(&unsigned, "untrusted comment: x\nRWQ=\n", &signed)
        .await
        .unwrap();
    let reader = PackageArchiveReader::open(&signed).await.unwrap();
    assert!(reader.is_signed());
    assert_eq!(reader.signature_text(), Some("untrusted comment: x\nRWQ=\n"));
    // The source archive is untouched
    assert!(!PackageArchiveReader::open(&unsigned).await.unwrap().is_signed());
}

#[tokio::test]
async fn test_other_reserved_entries_are_not_payload() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("p.spkg");
    write_tar(
        &pkg,
        &[
            ("data", "d"),
            (".signature/notes.txt", "n"),
            (".signaturefile", "s"),
        ],
    );
    let reader = PackageArchiveReader::open(&pkg).await.unwrap();
    let names: Vec<_> = reader.entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(names, ["data", ".signaturefile"]);
}

#[tokio::test]
async fn test_garbage_file_is_corrupted() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("bad.spkg");
    std::fs::write(&pkg, vec![0x5a; 2048]).unwrap();

    let err = PackageArchiveReader::open(&pkg).await.unwrap_err();
    assert!(matches!(err, Error::Package(PackageError::Corrupted { .. })));
}

#[tokio::test]
async fn test_missing_file_is_error() {
    let temp = TempDir::new().unwrap();
    let result = PackageArchiveReader::open(&temp.path().join("nope.spkg")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_duplicate_entry_rejected() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("dup.spkg");
    write_tar(&pkg, &[("a", "1"), ("a", "2")]);
    let err = PackageArchiveReader::open(&pkg).await.unwrap_err();
    assert!(matches!(err, Error::Package(PackageError::InvalidFormat { .. })));
}

#[tokio::test]
async fn test_signature_path_constant() {
    assert!(SIGNATURE_PATH.starts_with(".signature/"));
    assert!(has_package_extension(Path::new("x/y.spkg")));
    assert!(has_package_extension(Path::new("y.SPKG")));
    assert!(!has_package_extension(Path::new("y.tar")));
}
