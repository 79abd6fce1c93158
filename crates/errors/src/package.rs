//! Package-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PackageError {
    #[error("package not found: {name}")]
    NotFound { name: String },

    #[error("package corrupted: {message}")]
    Corrupted { message: String },

    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("invalid package format: {message}")]
    InvalidFormat { message: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "package.not_found",
            Self::Corrupted { .. } => "package.corrupted",
            Self::InvalidManifest { .. } => "package.invalid_manifest",
            Self::InvalidFormat { .. } => "package.invalid_format",
        };
        Some(code)
    }
}
