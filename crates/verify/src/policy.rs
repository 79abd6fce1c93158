//! Verification policy

/// Which checks are mandatory and which only produce warnings
///
/// Settings are plain values: the verifier receives a copy and never mutates
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct VerifierSettings {
    /// Accept packages without a signature
    pub allow_unsigned: bool,
    /// Accept signatures that do not verify against the signing key
    pub allow_illegal: bool,
    /// Accept signatures from keys outside the trust store
    pub allow_untrusted: bool,
    /// Accept signatures from trusted keys past their expiry
    pub allow_expired_keys: bool,
    /// Accept payload files missing from the content manifest
    pub allow_unrecorded_entries: bool,
    /// Warn about trust store keys that cannot be parsed
    pub report_unknown_keys: bool,
}

impl VerifierSettings {
    /// The policy used by the verify command
    #[must_use]
    pub const fn verify_command_default() -> Self {
        Self {
            allow_unsigned: false,
            allow_illegal: false,
            allow_untrusted: false,
            allow_expired_keys: false,
            allow_unrecorded_entries: false,
            report_unknown_keys: true,
        }
    }
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self::verify_command_default()
    }
}
