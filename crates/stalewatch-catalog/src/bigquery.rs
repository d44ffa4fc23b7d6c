//! BigQuery usage adapter over the query-log audit table
//!
//! Counts distinct jobs and users whose query text mentions a table within
//! the trailing window. Matching is deliberate substring containment
//! (CONTAINS_SUBSTR on alias AND database AND schema) - the same heuristic
//! the warehouse team has relied on, with its known false positives when an
//! alias string appears in an unrelated query. The pipeline's own
//! materialization runs are excluded by their query annotation.
//!
//! Required IAM permissions:
//! - bigquery.jobs.create
//! - read access on the configured query-log table
//!
//! ## Authentication
//!
//! 1. Service account JSON file (explicit path)
//! 2. Service account JSON content (inline)
//! 3. Application Default Credentials (ADC)

use crate::adapter::{TableIdentifier, UsageAdapter, UsageCounts, UsageError};

#[cfg(feature = "bigquery")]
use gcp_bigquery_client::{
    model::{
        query_parameter::QueryParameter, query_parameter_type::QueryParameterType,
        query_parameter_value::QueryParameterValue, query_request::QueryRequest,
        query_response::ResultSet,
    },
    Client as BigQueryClient,
};

/// Annotation dbt stamps into its own queries; anything carrying it is the
/// pipeline talking to itself, not a consumer
pub const DBT_QUERY_ANNOTATION: &str = r#""app": "dbt", "#;

/// BigQuery usage adapter
pub struct BigQueryAdapter {
    /// Project ID used for job submission
    project_id: String,

    /// Fully qualified query-log table, e.g. "project.audit.query_logs"
    query_log_table: String,

    /// BigQuery client (only available with bigquery feature)
    #[cfg(feature = "bigquery")]
    client: BigQueryClient,

    /// Placeholder for when feature is disabled
    #[cfg(not(feature = "bigquery"))]
    _phantom: std::marker::PhantomData<()>,
}

impl BigQueryAdapter {
    /// Create a new adapter using Application Default Credentials (ADC)
    ///
    /// ADC automatically detects credentials from:
    /// - GOOGLE_APPLICATION_CREDENTIALS environment variable
    /// - gcloud CLI default credentials
    /// - GCE/GKE metadata service
    #[cfg(feature = "bigquery")]
    pub async fn with_adc(
        project_id: impl Into<String>,
        query_log_table: impl Into<String>,
    ) -> Result<Self, UsageError> {
        let client = BigQueryClient::from_application_default_credentials()
            .await
            .map_err(|e| {
                UsageError::AuthenticationError(format!(
                    "Failed to authenticate with ADC: {}. \
                     Ensure GOOGLE_APPLICATION_CREDENTIALS is set or run \
                     'gcloud auth application-default login'",
                    e
                ))
            })?;

        Ok(Self {
            project_id: project_id.into(),
            query_log_table: query_log_table.into(),
            client,
        })
    }

    /// Create adapter without bigquery feature (returns error)
    #[cfg(not(feature = "bigquery"))]
    pub async fn with_adc(
        project_id: impl Into<String>,
        query_log_table: impl Into<String>,
    ) -> Result<Self, UsageError> {
        let _ = (project_id.into(), query_log_table.into());
        Err(UsageError::ConfigError(
            "BigQuery support not compiled. Rebuild with: cargo build --features bigquery"
                .to_string(),
        ))
    }

    /// Create a new adapter using a service account key file
    #[cfg(feature = "bigquery")]
    pub async fn from_service_account_file(
        project_id: impl Into<String>,
        query_log_table: impl Into<String>,
        key_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, UsageError> {
        let key_path_str = key_path.as_ref().to_string_lossy().to_string();

        let client = BigQueryClient::from_service_account_key_file(&key_path_str)
            .await
            .map_err(|e| {
                UsageError::AuthenticationError(format!(
                    "Failed to read service account key file '{}': {}",
                    key_path_str, e
                ))
            })?;

        Ok(Self {
            project_id: project_id.into(),
            query_log_table: query_log_table.into(),
            client,
        })
    }

    /// Create adapter without bigquery feature (returns error)
    #[cfg(not(feature = "bigquery"))]
    pub async fn from_service_account_file(
        project_id: impl Into<String>,
        query_log_table: impl Into<String>,
        _key_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, UsageError> {
        let _ = (project_id.into(), query_log_table.into());
        Err(UsageError::ConfigError(
            "BigQuery support not compiled. Rebuild with: cargo build --features bigquery"
                .to_string(),
        ))
    }

    /// Build the usage aggregation SQL
    ///
    /// Alias/database/schema and the window arrive as named query parameters
    /// rather than interpolated strings; only the query-log table name,
    /// which comes from operator configuration, is formatted in.
    fn usage_sql(&self) -> String {
        format!(
            r#"
            SELECT
              COUNT(DISTINCT q.job_id) AS query_count,
              COUNT(DISTINCT q.user_email) AS user_count
            FROM `{}` q
            WHERE q.created_date >= DATE_SUB(CURRENT_DATE(), INTERVAL @window_days DAY)
              AND CONTAINS_SUBSTR(q.query, @table_alias)
              AND CONTAINS_SUBSTR(q.query, @database)
              AND CONTAINS_SUBSTR(q.query, @schema)
              AND NOT CONTAINS_SUBSTR(q.query, '{}')
            "#,
            self.query_log_table, DBT_QUERY_ANNOTATION
        )
    }
}

#[cfg(feature = "bigquery")]
fn string_param(name: &str, value: &str) -> QueryParameter {
    QueryParameter {
        name: Some(name.to_string()),
        parameter_type: Some(QueryParameterType {
            r#type: "STRING".to_string(),
            ..Default::default()
        }),
        parameter_value: Some(QueryParameterValue {
            value: Some(value.to_string()),
            ..Default::default()
        }),
    }
}

#[cfg(feature = "bigquery")]
fn int_param(name: &str, value: i64) -> QueryParameter {
    QueryParameter {
        name: Some(name.to_string()),
        parameter_type: Some(QueryParameterType {
            r#type: "INT64".to_string(),
            ..Default::default()
        }),
        parameter_value: Some(QueryParameterValue {
            value: Some(value.to_string()),
            ..Default::default()
        }),
    }
}

#[async_trait::async_trait]
impl UsageAdapter for BigQueryAdapter {
    fn name(&self) -> &'static str {
        "BigQuery"
    }

    #[cfg(feature = "bigquery")]
    async fn count_recent_usage(
        &self,
        table: &TableIdentifier,
        window_days: u32,
    ) -> Result<UsageCounts, UsageError> {
        let mut request = QueryRequest::new(self.usage_sql());
        request.parameter_mode = Some("NAMED".to_string());
        request.query_parameters = Some(vec![
            string_param("table_alias", &table.table),
            string_param("database", &table.database),
            string_param("schema", &table.schema),
            int_param("window_days", i64::from(window_days)),
        ]);
        // Cached results would hide newly arrived log rows
        request.use_query_cache = Some(false);

        let response = self
            .client
            .job()
            .query(&self.project_id, request)
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("timeout") || err_str.contains("deadline") {
                    UsageError::Timeout(err_str)
                } else if err_str.contains("Access Denied") || err_str.contains("Permission") {
                    UsageError::PermissionDenied(format!(
                        "Cannot query usage for {}: {}",
                        table.fqn(),
                        err_str
                    ))
                } else {
                    UsageError::QueryError(err_str)
                }
            })?;

        let mut rs = ResultSet::new_from_query_response(response);
        if !rs.next_row() {
            return Err(UsageError::InvalidResponse(
                "usage query returned no rows".to_string(),
            ));
        }

        let query_count = rs
            .get_i64_by_name("query_count")
            .map_err(|e| UsageError::InvalidResponse(format!("Failed to get query_count: {}", e)))?
            .unwrap_or(0);

        let user_count = rs
            .get_i64_by_name("user_count")
            .map_err(|e| UsageError::InvalidResponse(format!("Failed to get user_count: {}", e)))?
            .unwrap_or(0);

        Ok(UsageCounts {
            query_count: query_count.max(0) as u64,
            user_count: user_count.max(0) as u64,
        })
    }

    /// Without the bigquery feature compiled, every lookup fails
    #[cfg(not(feature = "bigquery"))]
    async fn count_recent_usage(
        &self,
        _table: &TableIdentifier,
        _window_days: u32,
    ) -> Result<UsageCounts, UsageError> {
        Err(UsageError::ConfigError(
            "BigQuery support not compiled. Rebuild with: cargo build --features bigquery"
                .to_string(),
        ))
    }

    #[cfg(feature = "bigquery")]
    async fn test_connection(&self) -> Result<(), UsageError> {
        let request = QueryRequest::new("SELECT 1".to_string());
        self.client
            .job()
            .query(&self.project_id, request)
            .await
            .map_err(|e| UsageError::NetworkError(e.to_string()))?;
        Ok(())
    }

    #[cfg(not(feature = "bigquery"))]
    async fn test_connection(&self) -> Result<(), UsageError> {
        Err(UsageError::ConfigError(
            "BigQuery support not compiled. Rebuild with: cargo build --features bigquery"
                .to_string(),
        ))
    }
}
