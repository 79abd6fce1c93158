#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package signature verification
//!
//! [`VerifyCommand`] resolves an input path to package archives, runs each
//! package through the provider chain (integrity first, then signature trust)
//! under a fixed policy and reports issues of invalid packages as text lines.
//! The batch verdict is true only when every package verified.

mod command;
mod issue;
mod policy;
pub mod provider;
mod resolver;
mod result;
mod sink;
mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{summarize, VerifyCommand};
pub use issue::{IssueCode, LogLevel, LogMessage, SignatureLog};
pub use policy::VerifierSettings;
pub use provider::{
    IntegrityVerificationProvider, SignatureTrustAndValidityVerificationProvider,
    SignatureVerificationProvider,
};
pub use resolver::{LocalPackageResolver, PackageResolver};
pub use result::{ProviderResult, SignatureVerificationStatus, VerifySignaturesResult};
pub use sink::{DiagnosticBuffer, DiagnosticSink};
pub use verifier::{PackageSignatureVerifier, UNSIGNED_PROVIDER};

pub use tokio_util::sync::CancellationToken;
