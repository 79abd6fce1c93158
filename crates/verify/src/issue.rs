//! Verification issues and their leveled log form

use std::fmt;

/// Severity of a log message, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Verbose,
    Information,
    Minimal,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Verbose => "verbose",
            Self::Information => "information",
            Self::Minimal => "minimal",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifiers for every issue a provider can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    PackageNotSigned,
    ManifestMissing,
    ManifestInvalid,
    UnsupportedHashAlgorithm,
    EntryMissing,
    EntryHashMismatch,
    EntrySizeMismatch,
    UnrecordedEntry,
    IntegrityCheckFailed,
    SignatureInvalidFormat,
    SignatureMismatch,
    SignatureVerificationFailed,
    UntrustedSigner,
    ExpiredSigningKey,
    UnknownTrustedKeyFormat,
    SignatureVerified,
}

impl IssueCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PackageNotSigned => "PS3001",
            Self::ManifestMissing => "PS3002",
            Self::ManifestInvalid => "PS3003",
            Self::UnsupportedHashAlgorithm => "PS3004",
            Self::EntryMissing => "PS3005",
            Self::EntryHashMismatch => "PS3006",
            Self::EntrySizeMismatch => "PS3007",
            Self::UnrecordedEntry => "PS3008",
            Self::IntegrityCheckFailed => "PS3009",
            Self::SignatureInvalidFormat => "PS3010",
            Self::SignatureMismatch => "PS3011",
            Self::SignatureVerificationFailed => "PS3012",
            Self::UntrustedSigner => "PS3013",
            Self::ExpiredSigningKey => "PS3014",
            Self::UnknownTrustedKeyFormat => "PS3015",
            Self::SignatureVerified => "PS3016",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic raised by a verification provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureLog {
    pub code: IssueCode,
    pub level: LogLevel,
    pub message: String,
}

impl SignatureLog {
    /// Error when `fatal`, warning otherwise
    #[must_use]
    pub fn issue(fatal: bool, code: IssueCode, message: impl Into<String>) -> Self {
        let level = if fatal {
            LogLevel::Error
        } else {
            LogLevel::Warning
        };
        Self::new(level, code, message)
    }

    #[must_use]
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, code, message)
    }

    #[must_use]
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, code, message)
    }

    #[must_use]
    pub fn information(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Information, code, message)
    }

    fn new(level: LogLevel, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            level,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn as_log_message(&self) -> LogMessage {
        LogMessage {
            level: self.level,
            code: self.code,
            message: self.message.clone(),
        }
    }
}

/// Leveled message reported to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: LogLevel,
    pub code: IssueCode,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Verbose);
        assert!(LogLevel::Information < LogLevel::Warning);
        assert!(LogLevel::Minimal < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_issue_level_follows_fatality() {
        let fatal = SignatureLog::issue(true, IssueCode::UntrustedSigner, "x");
        let advisory = SignatureLog::issue(false, IssueCode::UntrustedSigner, "x");
        assert_eq!(fatal.level, LogLevel::Error);
        assert_eq!(advisory.level, LogLevel::Warning);
    }

    #[test]
    fn test_log_message_keeps_text_verbatim() {
        let log = SignatureLog::error(IssueCode::EntryMissing, "File 'a' is missing.");
        let message = log.as_log_message();
        assert_eq!(message.message, "File 'a' is missing.");
        assert_eq!(message.code.as_str(), "PS3005");
        assert_eq!(message.level, LogLevel::Error);
    }
}
