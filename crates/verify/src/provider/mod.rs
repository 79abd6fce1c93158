//! Verification providers
//!
//! A provider inspects one opened package and reports a status plus issues.
//! Providers never fail for a bad package; an `Err` means the check itself
//! could not run.

mod integrity;
mod trust;

pub use integrity::IntegrityVerificationProvider;
pub use trust::SignatureTrustAndValidityVerificationProvider;

use async_trait::async_trait;
use pkgsig_archive::PackageArchiveReader;
use pkgsig_errors::Error;
use tokio_util::sync::CancellationToken;

use crate::policy::VerifierSettings;
use crate::result::ProviderResult;

/// One stage of the verification chain
#[async_trait]
pub trait SignatureVerificationProvider: Send + Sync {
    /// Short provider name carried in results
    fn name(&self) -> &'static str;

    /// Check `package` under `settings`
    async fn get_trust_result(
        &self,
        package: &PackageArchiveReader,
        settings: VerifierSettings,
        cancel: &CancellationToken,
    ) -> Result<ProviderResult, Error>;
}
