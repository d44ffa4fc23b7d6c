//! Warehouse usage adapters for orphaned-table detection
//!
//! Adapters count recent query-log activity for a physical table, always
//! excluding the transformation pipeline's own materialization queries.
//!
//! ## Features
//!
//! Enable warehouse support via Cargo features:
//! - `bigquery` - Google BigQuery support
//!
//! ## Example
//!
//! ```rust,ignore
//! use stalewatch_catalog::{BigQueryAdapter, UsageAdapter, TableIdentifier};
//!
//! let adapter = BigQueryAdapter::with_adc("my-project", "my-project.audit.query_logs").await?;
//! let table = TableIdentifier::new("my-project", "analytics", "orders");
//! let counts = adapter.count_recent_usage(&table, 30).await?;
//! ```

pub mod adapter;
pub mod bigquery;
pub mod mock;

pub use adapter::{TableIdentifier, UsageAdapter, UsageCounts, UsageError};
pub use bigquery::{BigQueryAdapter, DBT_QUERY_ANNOTATION};
pub use mock::MockAdapter;
