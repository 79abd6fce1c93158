//! Verification command error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors surfaced to callers of the verify command.
///
/// Validation failures are not errors: they end up as diagnostic lines and a
/// `false` verdict. Only caller mistakes are reported through this type.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },
}

impl VerifyError {
    /// Build an `InvalidArgument` for a missing required input
    pub fn missing(name: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: "value is required".to_string(),
        }
    }
}

impl UserFacingError for VerifyError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { .. } => Some("Pass the path of a package or a directory."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { .. } => Some("verify.invalid_argument"),
        }
    }
}
