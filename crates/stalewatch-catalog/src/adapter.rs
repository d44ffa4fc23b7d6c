//! Warehouse adapter trait for query-log usage lookups

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a table in a warehouse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Database/project name
    pub database: String,

    /// Schema/dataset name
    pub schema: String,

    /// Table name (dbt alias)
    pub table: String,
}

impl TableIdentifier {
    /// Create a new table identifier
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// Observed query-log activity for a table over the trailing window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    /// Distinct queries that touched the table
    pub query_count: u64,

    /// Distinct users behind those queries
    pub user_count: u64,
}

impl UsageCounts {
    /// Confirmed zero activity - the orphan condition
    pub fn is_zero(&self) -> bool {
        self.query_count == 0 && self.user_count == 0
    }
}

/// Errors that can occur when querying usage
#[derive(Debug, Clone, thiserror::Error)]
pub enum UsageError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Query timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl UsageError {
    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QueryError(_) | Self::Timeout(_) | Self::NetworkError(_)
        )
    }
}

/// Trait for warehouse adapters that can count recent table usage
///
/// Implementations must exclude the transformation pipeline's own
/// materialization queries, so that a dbt run never counts as usage of the
/// tables it rebuilds.
#[async_trait::async_trait]
pub trait UsageAdapter: Send + Sync {
    /// Get the adapter name (e.g., "BigQuery")
    fn name(&self) -> &'static str;

    /// Count distinct queries and users that touched the table within the
    /// trailing window
    async fn count_recent_usage(
        &self,
        table: &TableIdentifier,
        window_days: u32,
    ) -> Result<UsageCounts, UsageError>;

    /// Test the connection to the warehouse
    async fn test_connection(&self) -> Result<(), UsageError>;
}
