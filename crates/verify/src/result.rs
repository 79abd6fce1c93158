//! Results produced by the provider chain

use crate::issue::{LogLevel, SignatureLog};

/// Outcome of a single provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVerificationStatus {
    /// Content or signature is damaged
    Suspect,
    /// Rejected by policy
    Disallowed,
    /// Signature is intact but the signer is not trusted
    Untrusted,
    Valid,
}

/// Status and issues reported by one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResult {
    pub provider: &'static str,
    pub trust: SignatureVerificationStatus,
    pub issues: Vec<SignatureLog>,
}

impl ProviderResult {
    #[must_use]
    pub fn new(
        provider: &'static str,
        trust: SignatureVerificationStatus,
        issues: Vec<SignatureLog>,
    ) -> Self {
        Self {
            provider,
            trust,
            issues,
        }
    }

    /// Valid unless an issue is an error, otherwise `failed`
    #[must_use]
    pub fn from_issues(
        provider: &'static str,
        failed: SignatureVerificationStatus,
        issues: Vec<SignatureLog>,
    ) -> Self {
        let trust = if issues.iter().any(|i| i.level >= LogLevel::Error) {
            failed
        } else {
            SignatureVerificationStatus::Valid
        };
        Self::new(provider, trust, issues)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.trust == SignatureVerificationStatus::Valid
    }
}

/// Combined result of every provider for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifySignaturesResult {
    pub valid: bool,
    pub results: Vec<ProviderResult>,
}

impl VerifySignaturesResult {
    /// Valid when there is at least one result and all of them are valid
    #[must_use]
    pub fn new(results: Vec<ProviderResult>) -> Self {
        let valid = !results.is_empty() && results.iter().all(ProviderResult::is_valid);
        Self { valid, results }
    }

    /// Every issue in provider order
    pub fn issues(&self) -> impl Iterator<Item = &SignatureLog> {
        self.results.iter().flat_map(|r| r.issues.iter())
    }
}
