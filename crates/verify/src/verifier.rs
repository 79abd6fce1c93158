//! The provider chain

use pkgsig_archive::PackageArchiveReader;
use pkgsig_errors::Error;
use tokio_util::sync::CancellationToken;

use crate::issue::{IssueCode, SignatureLog};
use crate::policy::VerifierSettings;
use crate::provider::SignatureVerificationProvider;
use crate::result::{ProviderResult, SignatureVerificationStatus, VerifySignaturesResult};

/// Provider name used for the result of an unsigned package
pub const UNSIGNED_PROVIDER: &str = "unsigned";

/// Runs every provider over a package, in order
pub struct PackageSignatureVerifier {
    providers: Vec<Box<dyn SignatureVerificationProvider>>,
}

impl PackageSignatureVerifier {
    #[must_use]
    pub fn new(providers: Vec<Box<dyn SignatureVerificationProvider>>) -> Self {
        Self { providers }
    }

    /// Provider names in execution order
    pub fn provider_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.iter().map(|p| p.name())
    }

    /// Verify one package
    ///
    /// Unsigned packages are judged by policy alone. Signed packages go
    /// through every provider; a failing provider does not stop the ones
    /// after it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `cancel` fires, or the error of a
    /// provider that could not run.
    pub async fn verify_signatures(
        &self,
        package: &PackageArchiveReader,
        settings: VerifierSettings,
        cancel: &CancellationToken,
    ) -> Result<VerifySignaturesResult, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if !package.is_signed() {
            let issue = SignatureLog::issue(
                !settings.allow_unsigned,
                IssueCode::PackageNotSigned,
                "The package is not signed.",
            );
            let trust = if settings.allow_unsigned {
                SignatureVerificationStatus::Valid
            } else {
                SignatureVerificationStatus::Disallowed
            };
            return Ok(VerifySignaturesResult::new(vec![ProviderResult::new(
                UNSIGNED_PROVIDER,
                trust,
                vec![issue],
            )]));
        }

        let mut results = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            results.push(provider.get_trust_result(package, settings, cancel).await?);
        }

        Ok(VerifySignaturesResult::new(results))
    }
}
