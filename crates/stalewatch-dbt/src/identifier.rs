//! Node identifier parsing and join-key derivation
//!
//! dbt unique_ids are dot-separated: `<kind>.<repository>.<name>` for most
//! resources, `source.<repository>.<source_name>.<table>` for sources. The
//! join key matches logically-equivalent nodes across independently built
//! repository graphs: a source declared in repo A that is really a model
//! materialized by repo B derives the same key as that model.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Resource kind, taken from the first id segment
///
/// Unknown kinds are carried verbatim, not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Source,
    Model,
    Seed,
    Snapshot,
    Test,
    #[serde(untagged)]
    Other(String),
}

impl ResourceKind {
    fn parse(segment: &str) -> Self {
        match segment {
            "source" => Self::Source,
            "model" => Self::Model,
            "seed" => Self::Seed,
            "snapshot" => Self::Snapshot,
            "test" => Self::Test,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Source => "source",
            Self::Model => "model",
            Self::Seed => "seed",
            Self::Snapshot => "snapshot",
            Self::Test => "test",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic fields decoded from a node id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// The full original id
    pub id: String,

    /// First segment
    pub resource_kind: ResourceKind,

    /// Second segment - the repository that defines this node
    pub owning_repository: String,

    /// Third segment, present only for sources (the dbt source name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,

    /// Last meaningful segment
    pub file_name: String,

    /// Derived cross-repository join key
    pub join_key: String,
}

/// Identifier parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Malformed node id '{id}': expected at least {expected} dot-separated segments, found {found}")]
    Malformed {
        id: String,
        expected: usize,
        found: usize,
    },
}

/// Parses node ids against a fixed set of known repository ids
///
/// The repository set decides whether a source reference points at another
/// pipeline (join key collapses onto that pipeline's model key) or at a
/// genuinely external system.
#[derive(Debug, Clone)]
pub struct IdentifierParser {
    repositories: HashSet<String>,
}

impl IdentifierParser {
    pub fn new(repositories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            repositories: repositories.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a repository id is part of this scan
    pub fn is_known_repository(&self, repository: &str) -> bool {
        self.repositories.contains(repository)
    }

    /// Decode a node id into its semantic fields and join key
    ///
    /// Pure and deterministic: equal inputs always yield equal attributes.
    pub fn parse(&self, id: &str) -> Result<NodeAttributes, IdentifierError> {
        let segments: Vec<&str> = id.split('.').collect();

        let malformed = |expected: usize| IdentifierError::Malformed {
            id: id.to_string(),
            expected,
            found: segments.len(),
        };

        if segments.len() < 3 {
            return Err(malformed(3));
        }

        let resource_kind = ResourceKind::parse(segments[0]);
        let owning_repository = segments[1].to_string();

        let (source_reference, file_name) = if resource_kind == ResourceKind::Source {
            if segments.len() < 4 {
                return Err(malformed(4));
            }
            (Some(segments[2].to_string()), segments[3].to_string())
        } else {
            (None, segments[2].to_string())
        };

        let join_key = match (&resource_kind, &source_reference) {
            (ResourceKind::Source, Some(reference)) if self.is_known_repository(reference) => {
                format!("{}_{}", reference, file_name)
            }
            (ResourceKind::Model, _) => format!("{}_{}", owning_repository, file_name),
            (kind, reference) => format!(
                "{}_{}_{}_{}",
                owning_repository,
                file_name,
                kind,
                reference.as_deref().unwrap_or("")
            ),
        };

        Ok(NodeAttributes {
            id: id.to_string(),
            resource_kind,
            owning_repository,
            source_reference,
            file_name,
            join_key,
        })
    }
}
