//! Mock usage adapter for testing
//!
//! Returns predefined usage counts without touching a warehouse. Useful for:
//! - Unit testing orphan classification
//! - Integration testing the full scan pipeline
//! - Simulating per-table query failures and latency

use crate::adapter::{TableIdentifier, UsageAdapter, UsageCounts, UsageError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock usage adapter
///
/// Stores counts in memory keyed by table FQN. Tables with no configured
/// counts report zero usage, which keeps end-to-end tests terse: only
/// actively used tables need explicit counts.
pub struct MockAdapter {
    /// Predefined counts by table FQN
    counts: Arc<RwLock<HashMap<String, UsageCounts>>>,

    /// Errors to return for specific tables; popped per call so retry
    /// behavior can be exercised (a table can fail n times, then succeed)
    errors: Arc<RwLock<HashMap<String, Vec<UsageError>>>>,

    /// Number of count_recent_usage calls, per table
    calls: Arc<RwLock<HashMap<String, u32>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(HashMap::new())),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Set usage counts for a table
    pub async fn set_counts(&self, table: TableIdentifier, counts: UsageCounts) {
        self.counts.write().await.insert(table.fqn(), counts);
    }

    /// Set usage counts using string identifiers for convenience
    pub async fn set_counts_for(
        &self,
        database: &str,
        schema: &str,
        table: &str,
        query_count: u64,
        user_count: u64,
    ) {
        self.set_counts(
            TableIdentifier::new(database, schema, table),
            UsageCounts {
                query_count,
                user_count,
            },
        )
        .await;
    }

    /// Queue an error for the next lookup of a table
    ///
    /// Errors are consumed in order; once drained, lookups fall through to
    /// the configured counts. Queue the same error repeatedly to exhaust a
    /// caller's retry budget.
    pub async fn push_error(&self, table: &TableIdentifier, error: UsageError) {
        self.errors
            .write()
            .await
            .entry(table.fqn())
            .or_default()
            .push(error);
    }

    /// Configure to fail all connection tests
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// How many times a table's usage was queried
    pub async fn call_count(&self, table: &TableIdentifier) -> u32 {
        self.calls.read().await.get(&table.fqn()).copied().unwrap_or(0)
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockAdapter {
    fn clone(&self) -> Self {
        Self {
            counts: Arc::clone(&self.counts),
            errors: Arc::clone(&self.errors),
            calls: Arc::clone(&self.calls),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl UsageAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn count_recent_usage(
        &self,
        table: &TableIdentifier,
        _window_days: u32,
    ) -> Result<UsageCounts, UsageError> {
        self.simulate_latency().await;

        *self.calls.write().await.entry(table.fqn()).or_default() += 1;

        let mut errors = self.errors.write().await;
        if let Some(queue) = errors.get_mut(&table.fqn()) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        drop(errors);

        Ok(self
            .counts
            .read()
            .await
            .get(&table.fqn())
            .copied()
            .unwrap_or_default())
    }

    async fn test_connection(&self) -> Result<(), UsageError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(UsageError::NetworkError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
