//! Signing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SigningError {
    #[error("signature verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("signature does not verify with trusted key {key_id}")]
    SignatureMismatch { key_id: String },

    #[error("no trusted key found for signature ({tried} keys tried)")]
    NoTrustedKeyFound { tried: usize },

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("invalid public key format: {0}")]
    InvalidPublicKey(String),

    #[error("signing failed: {message}")]
    SigningFailed { message: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoTrustedKeyFound { .. } => {
                Some("Add the publisher's public key to the trusted keys file.")
            }
            Self::InvalidPublicKey(_) => Some("Re-import the public key in minisign base64 form."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::VerificationFailed { .. } => "signing.verification_failed",
            Self::SignatureMismatch { .. } => "signing.signature_mismatch",
            Self::NoTrustedKeyFound { .. } => "signing.no_trusted_key",
            Self::InvalidSignatureFormat(_) => "signing.invalid_signature_format",
            Self::InvalidPublicKey(_) => "signing.invalid_public_key",
            Self::SigningFailed { .. } => "signing.signing_failed",
        };
        Some(code)
    }
}
