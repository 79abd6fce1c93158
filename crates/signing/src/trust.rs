//! Trusted key storage

use base64::{engine::general_purpose, Engine as _};
use pkgsig_errors::{ConfigError, Error, SigningError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

use crate::{Algorithm, PublicKeyRef};

/// Default file name of a trust store inside a keys directory
pub const TRUSTED_KEYS_FILE: &str = "trusted_keys.json";

/// A trusted public key with metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustedKey {
    /// Unique identifier for the key (hex-encoded keynum)
    pub key_id: String,
    /// The minisign public key data (base64)
    pub public_key: String,
    /// Optional comment/description
    pub comment: Option<String>,
    /// Timestamp when key was first trusted
    pub trusted_since: i64,
    /// Optional expiration timestamp
    pub expires_at: Option<i64>,
}

impl TrustedKey {
    /// Build a trusted key from its base64 public key, deriving the key id
    ///
    /// # Errors
    /// Returns an error if the public key is not valid minisign base64.
    pub fn from_public_key(public_key: &str, comment: Option<String>) -> Result<Self, Error> {
        Ok(Self {
            key_id: key_id_from_public_key(public_key)?,
            public_key: public_key.trim().to_string(),
            comment,
            trusted_since: chrono::Utc::now().timestamp(),
            expires_at: None,
        })
    }

    /// Whether the key has expired at unix time `now`
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    #[must_use]
    pub fn as_key_ref(&self) -> PublicKeyRef {
        PublicKeyRef {
            id: self.key_id.clone(),
            algo: Algorithm::Minisign,
            data: self.public_key.clone(),
        }
    }
}

/// Derive the hex key id (minisign keynum) from a base64 public key
///
/// # Errors
/// Returns an error if the key is not base64 or too short.
pub fn key_id_from_public_key(public_key: &str) -> Result<String, Error> {
    let decoded = general_purpose::STANDARD
        .decode(public_key.trim())
        .map_err(|e| SigningError::InvalidPublicKey(e.to_string()))?;
    if decoded.len() < 10 {
        return Err(SigningError::InvalidPublicKey("key too short".to_string()).into());
    }
    Ok(hex::encode(&decoded[2..10]))
}

/// The set of keys whose signatures are trusted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustStore {
    keys: BTreeMap<String, TrustedKey>,
}

impl TrustStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a trust store from a JSON file mapping key id to key
    ///
    /// A missing file yields an empty store. Entries are indexed by their
    /// `key_id` field; the JSON object key is only a label.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The trusted keys file cannot be read
    /// - The JSON content cannot be parsed
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let exists = fs::try_exists(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        if !exists {
            tracing::debug!(
                path = %path.display(),
                "no trusted keys file, using empty trust store"
            );
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        let entries: BTreeMap<String, TrustedKey> =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                message: format!("{}: {e}", path.display()),
            })?;

        let mut store = Self::new();
        for (label, key) in entries {
            if label != key.key_id {
                tracing::debug!(
                    %label,
                    key_id = %key.key_id,
                    "trusted key stored under another label"
                );
            }
            store.insert(key);
        }
        Ok(store)
    }

    /// Save the trust store as pretty JSON
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub async fn save(&self, path: &Path) -> Result<(), Error> {
        let content = serde_json::to_string_pretty(&self.keys)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Ok(())
    }

    pub fn insert(&mut self, key: TrustedKey) {
        self.keys.insert(key.key_id.clone(), key);
    }

    #[must_use]
    pub fn get(&self, key_id: &str) -> Option<&TrustedKey> {
        self.keys.get(key_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TrustedKey> {
        self.keys.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn key_refs(&self) -> Vec<PublicKeyRef> {
        self.keys.values().map(TrustedKey::as_key_ref).collect()
    }
}
