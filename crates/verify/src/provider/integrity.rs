//! Content integrity against the signed manifest

use async_trait::async_trait;
use pkgsig_archive::{ContentManifest, PackageArchiveReader, MANIFEST_VERSION};
use pkgsig_errors::Error;
use pkgsig_hash::{Hash, HashAlgorithm};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use super::SignatureVerificationProvider;
use crate::issue::{IssueCode, SignatureLog};
use crate::policy::VerifierSettings;
use crate::result::{ProviderResult, SignatureVerificationStatus};

/// Compares the archive's payload with the hashes recorded in its manifest
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrityVerificationProvider;

impl IntegrityVerificationProvider {
    pub const NAME: &'static str = "integrity";

    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn suspect(issue: SignatureLog) -> ProviderResult {
        ProviderResult::new(
            Self::NAME,
            SignatureVerificationStatus::Suspect,
            vec![issue],
        )
    }

    fn check(
        package: &PackageArchiveReader,
        manifest: &ContentManifest,
        settings: VerifierSettings,
    ) -> Vec<SignatureLog> {
        let mut issues = Vec::new();

        for recorded in &manifest.entries {
            let Some(actual) = package.entry(&recorded.path) else {
                issues.push(SignatureLog::error(
                    IssueCode::EntryMissing,
                    format!(
                        "The file '{}' is recorded in the manifest but missing from the package.",
                        recorded.path
                    ),
                ));
                continue;
            };

            let matches = Hash::from_hex(&recorded.blake3).is_ok_and(|h| h == actual.hash);
            if !matches {
                issues.push(SignatureLog::error(
                    IssueCode::EntryHashMismatch,
                    format!("The content hash of '{}' does not match the manifest.", recorded.path),
                ));
            } else if recorded.size != actual.size {
                issues.push(SignatureLog::error(
                    IssueCode::EntrySizeMismatch,
                    format!(
                        "The size of '{}' is {} bytes but the manifest records {} bytes.",
                        recorded.path, actual.size, recorded.size
                    ),
                ));
            }
        }

        let recorded: HashSet<&str> = manifest.entries.iter().map(|e| e.path.as_str()).collect();
        for entry in package.entries() {
            if !recorded.contains(entry.path.as_str()) {
                issues.push(SignatureLog::issue(
                    !settings.allow_unrecorded_entries,
                    IssueCode::UnrecordedEntry,
                    format!("The file '{}' is not recorded in the manifest.", entry.path),
                ));
            }
        }

        if issues.iter().any(|i| i.code != IssueCode::UnrecordedEntry) {
            issues.push(SignatureLog::error(
                IssueCode::IntegrityCheckFailed,
                "The package integrity check failed.",
            ));
        }

        issues
    }
}

#[async_trait]
impl SignatureVerificationProvider for IntegrityVerificationProvider {
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

        let Some(bytes) = package.manifest_bytes() else {
            return Ok(Self::suspect(SignatureLog::error(
                IssueCode::ManifestMissing,
                "The package does not contain a content manifest.",
            )));
        };

        let manifest = match ContentManifest::from_json(bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                return Ok(Self::suspect(SignatureLog::error(
                    IssueCode::ManifestInvalid,
                    format!("The package content manifest is invalid: {e}"),
                )));
            }
        };

        if manifest.version != MANIFEST_VERSION {
            return Ok(Self::suspect(SignatureLog::error(
                IssueCode::ManifestInvalid,
                format!(
                    "The content manifest version {} is not supported.",
                    manifest.version
                ),
            )));
        }

        if manifest.hash_algorithm() != Some(HashAlgorithm::Blake3) {
            return Ok(Self::suspect(SignatureLog::error(
                IssueCode::UnsupportedHashAlgorithm,
                format!(
                    "The content manifest uses the unsupported hash algorithm '{}'.",
                    manifest.algorithm
                ),
            )));
        }

        let issues = Self::check(package, &manifest, settings);
        tracing::debug!(
            package = %package.path().display(),
            issues = issues.len(),
            "integrity check finished"
        );

        Ok(ProviderResult::from_issues(
            Self::NAME,
            SignatureVerificationStatus::Suspect,
            issues,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::LogLevel;
    use crate::test_support::{write_raw_package, Fixture};
    use pkgsig_archive::MANIFEST_PATH;

    async fn run(
        package: &std::path::Path,
        settings: VerifierSettings,
    ) -> ProviderResult {
        let reader = PackageArchiveReader::open(package).await.unwrap();
        IntegrityVerificationProvider::new()
            .get_trust_result(&reader, settings, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_intact_package_is_valid() {
        let fixture = Fixture::new();
        let pkg = fixture.signed_package("good", &[("bin/tool", "tool")]).await;
        let result = run(&pkg, VerifierSettings::verify_command_default()).await;
        assert!(result.is_valid());
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_hash_mismatch_and_missing_entry() {
        let fixture = Fixture::new();
        let manifest = fixture.manifest_for(&[("a", "aaa"), ("b", "bbb")]);
        let pkg = fixture.path("tampered.spkg");
        write_raw_package(&pkg, &[("a", "AAA")], Some(manifest.as_slice()), None);

        let result = run(&pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Suspect);
        let codes: Vec<_> = result.issues.iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            [
                IssueCode::EntryHashMismatch,
                IssueCode::EntryMissing,
                IssueCode::IntegrityCheckFailed
            ]
        );
        assert_eq!(
            result.issues.last().unwrap().message,
            "The package integrity check failed."
        );
    }

    #[tokio::test]
    async fn test_unrecorded_entry_follows_policy() {
        let fixture = Fixture::new();
        let manifest = fixture.manifest_for(&[("a", "aaa")]);
        let pkg = fixture.path("extra.spkg");
        write_raw_package(&pkg, &[("a", "aaa"), ("extra", "x")], Some(manifest.as_slice()), None);

        let strict = run(&pkg, VerifierSettings::verify_command_default()).await;
        assert!(!strict.is_valid());
        assert_eq!(strict.issues.len(), 1);
        assert_eq!(strict.issues[0].level, LogLevel::Error);

        let settings = VerifierSettings {
            allow_unrecorded_entries: true,
            ..VerifierSettings::verify_command_default()
        };
        let lenient = run(&pkg, settings).await;
        assert!(lenient.is_valid());
        assert_eq!(lenient.issues[0].level, LogLevel::Warning);
    }

    #[tokio::test]
    async fn test_malformed_manifest_is_suspect() {
        let fixture = Fixture::new();
        let pkg = fixture.path("broken.spkg");
        write_raw_package(&pkg, &[("a", "a"), (MANIFEST_PATH, "{not json")], None, None);

        let result = run(&pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.trust, SignatureVerificationStatus::Suspect);
        assert_eq!(result.issues[0].code, IssueCode::ManifestInvalid);
    }

    #[tokio::test]
    async fn test_unsupported_algorithm() {
        let fixture = Fixture::new();
        let manifest = br#"{"version":1,"algorithm":"md5","entries":[]}"#;
        let pkg = fixture.path("md5.spkg");
        write_raw_package(&pkg, &[], Some(manifest.as_slice()), None);

        let result = run(&pkg, VerifierSettings::verify_command_default()).await;
        assert_eq!(result.issues[0].code, IssueCode::UnsupportedHashAlgorithm);
    }
}
