//! dbt manifest.json parsing (subset)
//!
//! The scan only needs each node's physical relation: database, schema and
//! alias. Everything else in the manifest is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Physical warehouse location of a materialized node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRef {
    pub database: String,
    pub schema: String,
    pub alias: String,
}

/// dbt manifest.json structure (the fields this pipeline reads)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Model and test nodes keyed by unique_id
    #[serde(default)]
    pub nodes: HashMap<String, ManifestNode>,
}

/// A node entry in the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub alias: Option<String>,
}

impl Manifest {
    /// Parse a manifest artifact from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        serde_json::from_slice(bytes).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Resolve a node id to its physical relation
    ///
    /// Fails with `NotFound` when the node is absent and `IncompleteEntry`
    /// when the entry is missing any of database/schema/alias - both are
    /// data-quality inconsistencies the caller should skip and report.
    pub fn lookup(&self, node_id: &str) -> Result<RelationRef, ManifestError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| ManifestError::NotFound(node_id.to_string()))?;

        match (&node.database, &node.schema, &node.alias) {
            (Some(database), Some(schema), Some(alias)) => Ok(RelationRef {
                database: database.clone(),
                schema: schema.clone(),
                alias: alias.clone(),
            }),
            _ => Err(ManifestError::IncompleteEntry(node_id.to_string())),
        }
    }
}

/// Manifest errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),

    #[error("Node '{0}' has no manifest entry")]
    NotFound(String),

    #[error("Manifest entry for '{0}' is missing database, schema or alias")]
    IncompleteEntry(String),
}
