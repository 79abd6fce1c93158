//! Integration tests for hash crate

use pkgsig_errors::{Error, StorageError};
use pkgsig_hash::Hash;

#[test]
fn test_from_hex_rejects_bad_digests() {
    let inputs = [
        "1234".to_string(),
        "a".repeat(65),
        "zz".repeat(32),
        String::new(),
    ];
    for input in &inputs {
        let err = Hash::from_hex(input).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::CorruptedData { .. })));
    }
}

#[test]
fn test_empty_input_digest() {
    let (hash, size) = Hash::hash_reader(std::io::empty()).unwrap();
    assert_eq!(size, 0);
    assert_eq!(hash, Hash::from_data(b""));
    assert_eq!(hash.to_string(), hash.to_hex());
}
