//! Stalewatch Core
//!
//! Stable domain types shared across the workspace: configuration,
//! diagnostic codes, and the versioned scan report.
//! Never rename diagnostic codes - they are part of the public API.

pub mod config;
pub mod diagnostic;
pub mod report;

pub use config::{Config, ConfigError, RetryPolicy, WarehouseConfig};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{OrphanRecord, OrphanReport, ReportVersion, ScanSummary, UnknownUsageRecord};
