//! Diagnostic codes for data-quality findings during a scan
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the report schema.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A node id did not parse into the expected segment structure
    MalformedIdentifier,

    /// The same node id appeared in more than one repository graph
    DuplicateNode,

    /// A repository's graph or manifest artifact could not be loaded
    RepositoryLoadFailed,

    /// A candidate model has no entry in its repository's manifest
    ManifestLookupFailed,

    /// The warehouse usage query failed after all retries
    UsageQueryFailed,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedIdentifier => "MALFORMED_IDENTIFIER",
            Self::DuplicateNode => "DUPLICATE_NODE",
            Self::RepositoryLoadFailed => "REPOSITORY_LOAD_FAILED",
            Self::ManifestLookupFailed => "MANIFEST_LOOKUP_FAILED",
            Self::UsageQueryFailed => "USAGE_QUERY_FAILED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Degraded result - a node or candidate was skipped
    Warn,

    /// A whole repository's contribution is missing from the scan
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single data-quality finding attached to the scan report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code
    pub code: DiagnosticCode,

    /// Severity
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Node id or repository id this finding is about, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Diagnostic {
    /// Warning-level diagnostic about a specific node or repository
    pub fn warn(code: DiagnosticCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warn,
            message: message.into(),
            subject: Some(subject.into()),
        }
    }

    /// Error-level diagnostic about a specific node or repository
    pub fn error(code: DiagnosticCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            subject: Some(subject.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strings_are_stable() {
        assert_eq!(DiagnosticCode::MalformedIdentifier.as_str(), "MALFORMED_IDENTIFIER");
        assert_eq!(DiagnosticCode::DuplicateNode.as_str(), "DUPLICATE_NODE");
        assert_eq!(DiagnosticCode::RepositoryLoadFailed.as_str(), "REPOSITORY_LOAD_FAILED");
        assert_eq!(DiagnosticCode::ManifestLookupFailed.as_str(), "MANIFEST_LOOKUP_FAILED");
        assert_eq!(DiagnosticCode::UsageQueryFailed.as_str(), "USAGE_QUERY_FAILED");
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn diagnostic_serializes_with_stable_code() {
        let diag = Diagnostic::warn(
            DiagnosticCode::MalformedIdentifier,
            "model.alpha",
            "expected at least 3 segments",
        );
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("MALFORMED_IDENTIFIER"));
        assert!(json.contains("\"warn\""));
    }
}
