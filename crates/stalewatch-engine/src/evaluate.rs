//! Usage evaluation and orphan classification
//!
//! Each candidate is queried independently against the warehouse query log;
//! a table is orphaned only when both its query count and its distinct-user
//! count are confirmed zero over the trailing window. A failed query never
//! counts as zero: after bounded retries the candidate is classified
//! Unknown and excluded from the orphan list.

use crate::extract::Candidate;
use stalewatch_core::{Diagnostic, DiagnosticCode, RetryPolicy};
use stalewatch_catalog::{TableIdentifier, UsageAdapter, UsageCounts, UsageError};

/// How a candidate's recent usage was classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageClassification {
    /// Confirmed zero queries and zero users - deletion candidate
    Orphaned,

    /// Observed activity within the window
    Active,

    /// Usage could not be determined (query failed after retries)
    Unknown { reason: String },
}

/// A candidate with its evaluated usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedCandidate {
    pub candidate: Candidate,

    /// Present unless classification is Unknown
    pub counts: Option<UsageCounts>,

    pub classification: UsageClassification,
}

/// Result of evaluating all candidates
#[derive(Debug, Default)]
pub struct EvaluationOutcome {
    pub evaluated: Vec<EvaluatedCandidate>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EvaluationOutcome {
    /// The final orphan list: confirmed zero-zero candidates only
    pub fn orphans(&self) -> impl Iterator<Item = &EvaluatedCandidate> {
        self.evaluated
            .iter()
            .filter(|e| e.classification == UsageClassification::Orphaned)
    }

    /// Candidates whose usage is unknown
    pub fn unknown(&self) -> impl Iterator<Item = &EvaluatedCandidate> {
        self.evaluated
            .iter()
            .filter(|e| matches!(e.classification, UsageClassification::Unknown { .. }))
    }
}

/// Evaluate every candidate's recent usage
///
/// Sequential per candidate; each result is stored on its own record so a
/// later query can never overwrite an earlier candidate's counts.
pub async fn evaluate(
    candidates: Vec<Candidate>,
    adapter: &dyn UsageAdapter,
    window_days: u32,
    retry: RetryPolicy,
) -> EvaluationOutcome {
    let mut outcome = EvaluationOutcome::default();

    for candidate in candidates {
        let table = TableIdentifier::new(
            candidate.relation.database.clone(),
            candidate.relation.schema.clone(),
            candidate.relation.alias.clone(),
        );

        match query_with_retry(adapter, &table, window_days, retry).await {
            Ok(counts) => {
                let classification = if counts.is_zero() {
                    UsageClassification::Orphaned
                } else {
                    UsageClassification::Active
                };
                outcome.evaluated.push(EvaluatedCandidate {
                    candidate,
                    counts: Some(counts),
                    classification,
                });
            }
            Err(e) => {
                tracing::warn!(node = %candidate.node_id, error = %e, "usage unknown after retries");
                outcome.diagnostics.push(Diagnostic::warn(
                    DiagnosticCode::UsageQueryFailed,
                    candidate.node_id.clone(),
                    e.to_string(),
                ));
                outcome.evaluated.push(EvaluatedCandidate {
                    candidate,
                    counts: None,
                    classification: UsageClassification::Unknown {
                        reason: e.to_string(),
                    },
                });
            }
        }
    }

    outcome
}

/// Run one usage query with bounded retries and exponential backoff
async fn query_with_retry(
    adapter: &dyn UsageAdapter,
    table: &TableIdentifier,
    window_days: u32,
    retry: RetryPolicy,
) -> Result<UsageCounts, UsageError> {
    let attempts = retry.max_attempts.max(1);

    let mut last_error = None;
    for attempt in 1..=attempts {
        match adapter.count_recent_usage(table, window_days).await {
            Ok(counts) => return Ok(counts),
            Err(e) => {
                let retryable = e.is_retryable();
                tracing::debug!(table = %table, attempt, error = %e, "usage query failed");
                last_error = Some(e);
                if !retryable || attempt == attempts {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(retry.delay_ms(attempt))).await;
            }
        }
    }

    Err(last_error.unwrap_or_else(|| UsageError::QueryError("no attempts made".to_string())))
}
