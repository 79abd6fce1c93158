//! Signature validity and signer trust

use async_trait::async_trait;
use pkgsig_archive::PackageArchiveReader;
use pkgsig_errors::{Error, SigningError};
use pkgsig_signing::{decode_signature, parse_public_key, verify_decoded_with_keys, TrustStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::SignatureVerificationProvider;
use crate::issue::{IssueCode, SignatureLog};
use crate::policy::VerifierSettings;
use crate::result::{ProviderResult, SignatureVerificationStatus};

/// Verifies the manifest signature against the trust store
#[derive(Debug, Clone)]
pub struct SignatureTrustAndValidityVerificationProvider {
    trust: Arc<TrustStore>,
}

impl SignatureTrustAndValidityVerificationProvider {
    pub const NAME: &'static str = "trust";

    #[must_use]
    pub fn new(trust: Arc<TrustStore>) -> Self {
        Self { trust }
    }

    /// Warnings for trust store keys that cannot be used
    fn unknown_key_issues(&self, settings: VerifierSettings) -> Vec<SignatureLog> {
        if !settings.report_unknown_keys {
            return Vec::new();
        }
        self.trust
            .keys()
            .filter(|key| parse_public_key(&key.public_key).is_err())
            .map(|key| {
                SignatureLog::warning(
                    IssueCode::UnknownTrustedKeyFormat,
                    format!(
                        "The trusted key '{}' has an unknown format and was ignored.",
                        key.key_id
                    ),
                )
            })
            .collect()
    }

    fn evaluate(
        &self,
        content: &[u8],
        signature: &str,
        settings: VerifierSettings,
    ) -> ProviderResult {
        let mut issues = self.unknown_key_issues(settings);

        let sig = match decode_signature(signature) {
            Ok(sig) => sig,
            Err(e) => {
                issues.push(SignatureLog::error(
                    IssueCode::SignatureInvalidFormat,
                    format!("The package signature could not be read: {}", reason(&e)),
                ));
                return ProviderResult::new(
                    Self::NAME,
                    SignatureVerificationStatus::Suspect,
                    issues,
                );
            }
        };

        let trust = match verify_decoded_with_keys(content, &sig, &self.trust.key_refs()) {
            Ok(key_id) => self.check_signer(&key_id, settings, &mut issues),
            Err(Error::Signing(SigningError::SignatureMismatch { key_id, .. })) => {
                issues.push(SignatureLog::issue(
                    !settings.allow_illegal,
                    IssueCode::SignatureMismatch,
                    format!(
                        "The package signature does not match its content for key '{key_id}'."
                    ),
                ));
                status_or_valid(settings.allow_illegal, SignatureVerificationStatus::Suspect)
            }
            Err(Error::Signing(SigningError::NoTrustedKeyFound { .. })) => {
                issues.push(SignatureLog::issue(
                    !settings.allow_untrusted,
                    IssueCode::UntrustedSigner,
                    "The package is signed by a key that is not trusted.",
                ));
                status_or_valid(
                    settings.allow_untrusted,
                    SignatureVerificationStatus::Untrusted,
                )
            }
            Err(e) => {
                issues.push(SignatureLog::error(
                    IssueCode::SignatureVerificationFailed,
                    format!("The package signature could not be verified: {}", reason(&e)),
                ));
                SignatureVerificationStatus::Suspect
            }
        };

        ProviderResult::new(Self::NAME, trust, issues)
    }

    fn check_signer(
        &self,
        key_id: &str,
        settings: VerifierSettings,
        issues: &mut Vec<SignatureLog>,
    ) -> SignatureVerificationStatus {
        let now = chrono::Utc::now().timestamp();
        let expired = self.trust.get(key_id).is_some_and(|k| k.is_expired_at(now));

        if expired {
            issues.push(SignatureLog::issue(
                !settings.allow_expired_keys,
                IssueCode::ExpiredSigningKey,
                format!("The package is signed by the expired key '{key_id}'."),
            ));
            return status_or_valid(
                settings.allow_expired_keys,
                SignatureVerificationStatus::Untrusted,
            );
        }

        issues.push(SignatureLog::information(
            IssueCode::SignatureVerified,
            format!("The package signature was verified with trusted key '{key_id}'."),
        ));
        SignatureVerificationStatus::Valid
    }
}

fn status_or_valid(
    allowed: bool,
    status: SignatureVerificationStatus,
) -> SignatureVerificationStatus {
    if allowed {
        SignatureVerificationStatus::Valid
    } else {
        status
    }
}

/// Innermost message of a signing error
fn reason(err: &Error) -> String {
    match err {
        Error::Signing(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SignatureVerificationProvider for SignatureTrustAndValidityVerificationProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn get_trust_result(
        &self,
        package: &PackageArchiveReader,
        settings: VerifierSettings,
        cancel: &CancellationToken,
    ) -> Result<ProviderResult, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let Some(signature) = package.signature_text() else {
            return Ok(ProviderResult::new(
                Self::NAME,
                SignatureVerificationStatus::Disallowed,
                vec![SignatureLog::error(
                    IssueCode::PackageNotSigned,
                    "The package is not signed.",
                )],
            ));
        };
        // A signature without a manifest has nothing to cover
        let content = package.manifest_bytes().unwrap_or_default();

        let result = self.evaluate(content, signature, settings);
        tracing::debug!(
            package = %package.path().display(),
            trust = ?result.trust,
            "signature check finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::LogLevel;
    use crate::test_support::{write_raw_package, Fixture};
    use pkgsig_signing::TrustedKey;

    async fn run(
        provider: &SignatureTrustAndValidityVerificationProvider,
        package: &std::path::Path,
        settings: VerifierSettings,
    ) -> ProviderResult {
        let reader = PackageArchiveReader::open(package).await.unwrap();
        provider
            .get_trust_result(&reader, settings, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_trusted_signature_is_valid() {
        let fixture = Fixture::new();
        let pkg = fixture.signed_package("good", &[("a", "a")]).await;
        let provider = SignatureTrustAndValidityVerificationProvider::new(fixture.trust());

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert!(result.is_valid());
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].level, LogLevel::Information);
        assert!(result.issues[0].message.contains(&fixture.key_id()));
    }

    #[tokio::test]
    async fn test_untrusted_signer() {
        let fixture = Fixture::new();
        let pkg = fixture.signed_package("good", &[("a", "a")]).await;
        let provider =
            SignatureTrustAndValidityVerificationProvider::new(Arc::new(TrustStore::new()));

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Untrusted);
        assert_eq!(result.issues[0].level, LogLevel::Error);

        let settings = VerifierSettings {
            allow_untrusted: true,
            ..VerifierSettings::verify_command_default()
        };
        let result = run(&provider, &pkg, settings).await;
        assert!(result.is_valid());
        assert_eq!(result.issues[0].level, LogLevel::Warning);
    }

    #[tokio::test]
    async fn test_signature_over_other_content_is_suspect() {
        let fixture = Fixture::new();
        let manifest = fixture.manifest_for(&[("a", "a")]);
        let signature = fixture.sign(b"something else");
        let pkg = fixture.path("forged.spkg");
        write_raw_package(
            &pkg,
            &[("a", "a")],
            Some(manifest.as_slice()),
            Some(signature.as_str()),
        );
        let provider = SignatureTrustAndValidityVerificationProvider::new(fixture.trust());

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Suspect);
        assert_eq!(result.issues[0].code, IssueCode::SignatureMismatch);
    }

    #[tokio::test]
    async fn test_garbled_signature_is_suspect() {
        let fixture = Fixture::new();
        let manifest = fixture.manifest_for(&[("a", "a")]);
        let pkg = fixture.path("garbled.spkg");
        write_raw_package(
            &pkg,
            &[("a", "a")],
            Some(manifest.as_slice()),
            Some("garbage"),
        );
        let provider = SignatureTrustAndValidityVerificationProvider::new(fixture.trust());

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Suspect);
        assert_eq!(result.issues[0].code, IssueCode::SignatureInvalidFormat);
    }

    #[tokio::test]
    async fn test_expired_key() {
        let fixture = Fixture::new();
        let pkg = fixture.signed_package("good", &[("a", "a")]).await;
        let mut store = TrustStore::new();
        let mut key = TrustedKey::from_public_key(&fixture.public_key(), None).unwrap();
        key.expires_at = Some(1);
        store.insert(key);
        let provider = SignatureTrustAndValidityVerificationProvider::new(Arc::new(store));

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Untrusted);
        assert_eq!(result.issues[0].code, IssueCode::ExpiredSigningKey);
    }

    #[tokio::test]
    async fn test_expired_key_under_other_label_in_file() {
        let fixture = Fixture::new();
        let pkg = fixture.signed_package("good", &[("a", "a")]).await;
        let keys_file = fixture.path("trusted_keys.json");
        let mut entry = TrustedKey::from_public_key(&fixture.public_key(), None).unwrap();
        entry.expires_at = Some(1);
        let labelled = std::collections::BTreeMap::from([("release-key", entry)]);
        let content = serde_json::to_string(&labelled).unwrap();
        tokio::fs::write(&keys_file, content).await.unwrap();
        let store = TrustStore::load(&keys_file).await.unwrap();
        let provider = SignatureTrustAndValidityVerificationProvider::new(Arc::new(store));

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Untrusted);
        assert_eq!(result.issues[0].code, IssueCode::ExpiredSigningKey);
        assert_eq!(result.issues[0].level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_unknown_key_format_reported() {
        let fixture = Fixture::new();
        let pkg = fixture.signed_package("good", &[("a", "a")]).await;
        let mut store = (*fixture.trust()).clone();
        store.insert(TrustedKey {
            key_id: "bogus".to_string(),
            public_key: "not-a-key".to_string(),
            comment: None,
            trusted_since: 0,
            expires_at: None,
        });
        let provider = SignatureTrustAndValidityVerificationProvider::new(Arc::new(store));

        let result = run(&provider, &pkg, VerifierSettings::verify_command_default()).await;
        assert!(result.is_valid());
        assert_eq!(result.issues[0].code, IssueCode::UnknownTrustedKeyFormat);
        assert_eq!(result.issues[0].level, LogLevel::Warning);

        let quiet = VerifierSettings {
            report_unknown_keys: false,
            ..VerifierSettings::verify_command_default()
        };
        let result = run(&provider, &pkg, quiet).await;
        assert_eq!(result.issues.len(), 1);
    }
}
