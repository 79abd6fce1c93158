#![deny(clippy::pedantic, unsafe_code)]

//! Minisign signatures for pkgsig packages
//!
//! Verification goes through `minisign-verify`; creating signatures (for the
//! `sign` command and for test fixtures) goes through `minisign`.

mod sign;
mod trust;

pub use sign::{generate_keypair, load_secret_key, save_secret_key, sign_bytes, KeyPair};
pub use trust::{key_id_from_public_key, TrustStore, TrustedKey, TRUSTED_KEYS_FILE};

use minisign_verify::{PublicKey, Signature};
use pkgsig_errors::{Error, SigningError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Minisign,
    // OpenPgp (future)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyRef {
    pub id: String,
    pub algo: Algorithm,
    pub data: String,
}

/// Decode a minisign signature string (including comment lines)
///
/// # Errors
/// Returns `SigningError::InvalidSignatureFormat` if the text is not a minisign signature.
pub fn decode_signature(signature_str: &str) -> Result<Signature, Error> {
    Signature::decode(signature_str)
        .map_err(|e| SigningError::InvalidSignatureFormat(e.to_string()).into())
}

/// Parse a base64 minisign public key
///
/// # Errors
/// Returns `SigningError::InvalidPublicKey` if the key cannot be parsed.
pub fn parse_public_key(data: &str) -> Result<PublicKey, Error> {
    PublicKey::from_base64(data.trim())
        .map_err(|e| SigningError::InvalidPublicKey(e.to_string()).into())
}

/// Verify raw bytes against a minisign signature string using any of the provided trusted keys.
/// Returns the key id that successfully verified.
///
/// # Errors
/// - `InvalidSignatureFormat` if the signature cannot be parsed
/// - `SignatureMismatch` if a key with the signature's key id exists but the signature is invalid
/// - `NoTrustedKeyFound` if no provided key carries the signature's key id
pub fn verify_minisign_bytes_with_keys(
    content: &[u8],
    signature_str: &str,
    trusted_keys: &[PublicKeyRef],
) -> Result<String, Error> {
    let sig = decode_signature(signature_str)?;
    verify_decoded_with_keys(content, &sig, trusted_keys)
}

/// Same as [`verify_minisign_bytes_with_keys`] for an already decoded signature.
///
/// Keys that fail to parse are skipped.
///
/// # Errors
/// See [`verify_minisign_bytes_with_keys`].
pub fn verify_decoded_with_keys(
    content: &[u8],
    sig: &Signature,
    trusted_keys: &[PublicKeyRef],
) -> Result<String, Error> {
    let mut tried = 0usize;
    for key in trusted_keys {
        if key.algo != Algorithm::Minisign {
            continue;
        }
        let Ok(pk) = parse_public_key(&key.data) else {
            tracing::debug!(key_id = %key.id, "skipping unparsable trusted key");
            continue;
        };
        tried += 1;
        match pk.verify(content, sig, false) {
            Ok(()) => return Ok(key.id.clone()),
            Err(minisign_verify::Error::UnexpectedKeyId) => {}
            Err(minisign_verify::Error::InvalidSignature) => {
                return Err(SigningError::SignatureMismatch {
                    key_id: key.id.clone(),
                }
                .into());
            }
            Err(e) => {
                return Err(SigningError::VerificationFailed {
                    reason: e.to_string(),
                }
                .into());
            }
        }
    }

    Err(SigningError::NoTrustedKeyFound { tried }.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_ref(pair: &KeyPair, id: &str) -> PublicKeyRef {
        PublicKeyRef {
            id: id.to_string(),
            algo: Algorithm::Minisign,
            data: pair.public_key_base64(),
        }
    }

    #[test]
    fn test_verify_with_matching_key() {
        let pair = generate_keypair().unwrap();
        let sig = sign_bytes(&pair.secret_key, b"payload", Some("test")).unwrap();

        let other = generate_keypair().unwrap();
        let keys = vec![key_ref(&other, "other"), key_ref(&pair, "main")];
        let id = verify_minisign_bytes_with_keys(b"payload", &sig, &keys).unwrap();
        assert_eq!(id, "main");
    }

    #[test]
    fn test_tampered_content_is_mismatch() {
        let pair = generate_keypair().unwrap();
        let sig = sign_bytes(&pair.secret_key, b"payload", None).unwrap();

        let err = verify_minisign_bytes_with_keys(b"payl0ad", &sig, &[key_ref(&pair, "main")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::SignatureMismatch { ref key_id }) if key_id == "main"
        ));
    }

    #[test]
    fn test_unknown_signer() {
        let pair = generate_keypair().unwrap();
        let other = generate_keypair().unwrap();
        let sig = sign_bytes(&pair.secret_key, b"payload", None).unwrap();

        let err = verify_minisign_bytes_with_keys(b"payload", &sig, &[key_ref(&other, "other")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::NoTrustedKeyFound { tried: 1 })
        ));

        let err = verify_minisign_bytes_with_keys(b"payload", &sig, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::NoTrustedKeyFound { tried: 0 })
        ));
    }

    #[test]
    fn test_malformed_signature() {
        let err = verify_minisign_bytes_with_keys(b"payload", "not a signature", &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::InvalidSignatureFormat(_))
        ));
    }
}
