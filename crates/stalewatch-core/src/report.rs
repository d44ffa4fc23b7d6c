//! Scan report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::diagnostic::Diagnostic;
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Repositories whose artifacts loaded successfully
    pub repositories_loaded: usize,

    /// Repositories whose artifacts failed to load
    pub repositories_failed: usize,

    /// Nodes in the merged graph
    pub nodes: usize,

    /// Cross-repository edges added by inference
    pub edges_inferred: usize,

    /// Leaf model candidates found
    pub candidates: usize,

    /// Candidates confirmed orphaned (zero queries, zero users)
    pub orphans: usize,

    /// Candidates whose usage could not be determined
    pub unknown_usage: usize,

    /// Nodes or candidates skipped for data-quality reasons
    pub skipped: usize,
}

/// One confirmed orphan table in the final deletion candidate list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanRecord {
    pub database: String,
    pub schema: String,
    pub alias: String,

    /// The dbt node that materializes this table
    pub node_name: String,

    /// Always zero for a confirmed orphan; kept explicit so the report
    /// never conflates "unqueried" with "unknown"
    pub query_count: u64,
    pub user_count: u64,
}

/// A candidate whose usage query failed after all retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownUsageRecord {
    pub database: String,
    pub schema: String,
    pub alias: String,
    pub node_name: String,

    /// Last error from the warehouse adapter
    pub reason: String,
}

/// Scan report (report.json v1)
///
/// This is the stable output format.
/// All fields are versioned and backward-compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Trailing query-log window the scan used, in days
    pub window_days: u32,

    /// Summary statistics
    pub summary: ScanSummary,

    /// Confirmed orphan tables, sorted by node name
    pub orphans: Vec<OrphanRecord>,

    /// Candidates excluded because usage could not be confirmed
    pub unknown: Vec<UnknownUsageRecord>,

    /// All data-quality findings from the scan
    pub diagnostics: Vec<Diagnostic>,
}

impl OrphanReport {
    /// Create a report stamped with the current time
    pub fn new(window_days: u32) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            window_days,
            summary: ScanSummary::default(),
            orphans: Vec::new(),
            unknown: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
