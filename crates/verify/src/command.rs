//! The verify command

use pkgsig_archive::PackageArchiveReader;
use pkgsig_errors::{Error, VerifyError};
use pkgsig_signing::TrustStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::issue::{LogLevel, LogMessage, SignatureLog};
use crate::policy::VerifierSettings;
use crate::provider::{
    IntegrityVerificationProvider, SignatureTrustAndValidityVerificationProvider,
};
use crate::resolver::{LocalPackageResolver, PackageResolver};
use crate::sink::DiagnosticSink;
use crate::verifier::PackageSignatureVerifier;

/// Verifies every package named by an input path
///
/// Each invalid package contributes its issue messages, one per line in
/// provider order, followed by a summary line when any issue is a warning or
/// worse. Valid packages contribute nothing.
pub struct VerifyCommand<R: PackageResolver = LocalPackageResolver> {
    resolver: R,
    trust: Arc<TrustStore>,
}

impl VerifyCommand<LocalPackageResolver> {
    #[must_use]
    pub fn new(trust: TrustStore) -> Self {
        Self::with_resolver(LocalPackageResolver::new(), Arc::new(trust))
    }
}

impl<R: PackageResolver> VerifyCommand<R> {
    #[must_use]
    pub fn with_resolver(resolver: R, trust: Arc<TrustStore>) -> Self {
        Self { resolver, trust }
    }

    /// Verify the packages at `path`, writing diagnostics to `buffer`
    ///
    /// Returns `Ok(true)` only if every package is valid. Failures other
    /// than a bad argument are logged once and reported as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::InvalidArgument` if `path` is empty.
    pub async fn verify<S>(&self, path: &str, buffer: &mut S) -> Result<bool, Error>
    where
        S: DiagnosticSink + ?Sized,
    {
        self.verify_with_cancellation(path, buffer, &CancellationToken::new())
            .await
    }

    /// [`verify`](Self::verify) with a caller controlled cancellation token
    ///
    /// Cancellation aborts the invocation like any other unexpected failure.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::InvalidArgument` if `path` is empty.
    pub async fn verify_with_cancellation<S>(
        &self,
        path: &str,
        buffer: &mut S,
        cancel: &CancellationToken,
    ) -> Result<bool, Error>
    where
        S: DiagnosticSink + ?Sized,
    {
        if path.trim().is_empty() {
            return Err(VerifyError::missing("path").into());
        }

        match self.run(path, buffer, cancel).await {
            Ok(verdict) => Ok(verdict),
            Err(e) => {
                tracing::error!(path, "package verification failed: {e}");
                Ok(false)
            }
        }
    }

    fn verifier(&self) -> PackageSignatureVerifier {
        PackageSignatureVerifier::new(vec![
            Box::new(IntegrityVerificationProvider::new()),
            Box::new(SignatureTrustAndValidityVerificationProvider::new(
                Arc::clone(&self.trust),
            )),
        ])
    }

    async fn run<S>(
        &self,
        path: &str,
        buffer: &mut S,
        cancel: &CancellationToken,
    ) -> Result<bool, Error>
    where
        S: DiagnosticSink + ?Sized,
    {
        let verifier = self.verifier();
        let settings = VerifierSettings::verify_command_default();
        let packages = self.resolver.resolve(path).await?;

        let mut verdict = true;
        for package_path in packages {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let result = {
                let package = PackageArchiveReader::open(&package_path).await?;
                verifier.verify_signatures(&package, settings, cancel).await?
            };

            if !result.valid {
                let messages: Vec<LogMessage> =
                    result.issues().map(SignatureLog::as_log_message).collect();
                for message in &messages {
                    buffer.append_line(&message.message);
                }
                if let Some(summary) = summarize(&messages) {
                    buffer.append_line(&summary);
                }
            }

            verdict = verdict && result.valid;
        }

        Ok(verdict)
    }
}

/// Summary line for an invalid package's messages
///
/// `None` unless some message is a warning or worse. Errors and warnings are
/// counted separately.
#[must_use]
pub fn summarize(messages: &[LogMessage]) -> Option<String> {
    if !messages.iter().any(|m| m.level >= LogLevel::Warning) {
        return None;
    }

    let errors = messages.iter().filter(|m| m.level == LogLevel::Error).count();
    let warnings = messages
        .iter()
        .filter(|m| m.level == LogLevel::Warning)
        .count();

    Some(format!("Finished with {errors} errors and {warnings} warnings."))
}
