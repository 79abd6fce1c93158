//! Signature creation with minisign

use minisign::{PublicKey, SecretKey, SecretKeyBox};
use pkgsig_errors::{Error, SigningError};
use std::io::Cursor;
use std::path::Path;
use tokio::fs;

use crate::trust::key_id_from_public_key;

/// A freshly generated minisign key pair
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

impl KeyPair {
    /// Public key in the single-line base64 form stored in trust stores
    #[must_use]
    pub fn public_key_base64(&self) -> String {
        public_key_base64(&self.public_key)
    }

    /// Hex key id derived from the public key
    #[must_use]
    pub fn key_id(&self) -> String {
        key_id_from_public_key(&self.public_key_base64()).unwrap_or_default()
    }
}

fn public_key_base64(pk: &PublicKey) -> String {
    // The box renders as "untrusted comment: ...\n<base64>\n"
    pk.to_box()
        .map(|b| b.to_string())
        .unwrap_or_default()
        .lines()
        .rfind(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Generate an unencrypted key pair
///
/// # Errors
///
/// Returns an error if key pair generation fails.
pub fn generate_keypair() -> Result<KeyPair, Error> {
    let minisign::KeyPair { pk, sk } =
        minisign::KeyPair::generate_unencrypted_keypair().map_err(|e| {
            SigningError::SigningFailed {
                message: format!("Failed to generate key pair: {e}"),
            }
        })?;

    Ok(KeyPair {
        public_key: pk,
        secret_key: sk,
    })
}

/// Sign `content`, returning the full minisign signature text
///
/// # Errors
///
/// Returns an error if signature creation fails.
pub fn sign_bytes(
    secret_key: &SecretKey,
    content: &[u8],
    trusted_comment: Option<&str>,
) -> Result<String, Error> {
    let signature = minisign::sign(
        None,
        secret_key,
        Cursor::new(content),
        Some(trusted_comment.unwrap_or("pkgsig package signature")),
        Some("signature from pkgsig secret key"),
    )
    .map_err(|e| SigningError::SigningFailed {
        message: format!("Failed to create signature: {e}"),
    })?;

    Ok(signature.into_string())
}

/// Save a secret key to file
///
/// # Errors
///
/// Returns an error if key serialization or file writing fails.
pub async fn save_secret_key(secret_key: &SecretKey, path: &Path) -> Result<(), Error> {
    let sk_box = secret_key
        .to_box(None)
        .map_err(|e| SigningError::SigningFailed {
            message: format!("Failed to serialize secret key: {e}"),
        })?;

    fs::write(path, sk_box.to_string())
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;

    Ok(())
}

/// Load a secret key from file, decrypting it with `password` when given
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or decrypted.
pub async fn load_secret_key(path: &Path, password: Option<String>) -> Result<SecretKey, Error> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;

    let sk_box = SecretKeyBox::from_string(&text).map_err(|e| SigningError::SigningFailed {
        message: format!("Failed to parse private key: {e}"),
    })?;

    sk_box
        .into_secret_key(password)
        .map_err(|e| {
            SigningError::SigningFailed {
                message: format!("Failed to decrypt private key: {e}"),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_keypair_generation() {
        let pair = generate_keypair().unwrap();
        assert!(!pair.public_key_base64().is_empty());
        assert_eq!(pair.key_id().len(), 16);
    }

    #[tokio::test]
    async fn test_secret_key_roundtrip_signs_verifiably() {
        let temp = tempdir().unwrap();
        let pair = generate_keypair().unwrap();
        let path = temp.path().join("secret.key");

        save_secret_key(&pair.secret_key, &path).await.unwrap();
        let loaded = load_secret_key(&path, None).await.unwrap();

        let sig = sign_bytes(&loaded, b"content", None).unwrap();
        let keys = [crate::PublicKeyRef {
            id: pair.key_id(),
            algo: crate::Algorithm::Minisign,
            data: pair.public_key_base64(),
        }];
        let id = crate::verify_minisign_bytes_with_keys(b"content", &sig, &keys).unwrap();
        assert_eq!(id, pair.key_id());
    }

    #[tokio::test]
    async fn test_load_missing_secret_key() {
        let temp = tempdir().unwrap();
        assert!(load_secret_key(&temp.path().join("nope.key"), None)
            .await
            .is_err());
    }
}
