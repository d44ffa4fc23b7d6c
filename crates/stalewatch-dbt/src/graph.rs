//! Lineage graph construction and merging
//!
//! Each repository publishes its dependency graph as a JSON artifact
//! (`graph.json`: node ids plus producer → consumer edge pairs). Merging is
//! a pure fold over the documents in configuration order; node and edge
//! sets are unioned, so merging is idempotent and order-insensitive up to
//! duplicate-id attribute ties.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Node identifier (dbt unique_id)
pub type NodeId = String;

/// Serialized per-repository dependency graph artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// All node ids, including nodes with no edges
    pub nodes: Vec<NodeId>,

    /// Directed edges as `[producer, consumer]` pairs
    pub edges: Vec<(NodeId, NodeId)>,
}

impl GraphDocument {
    /// Parse a graph artifact from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        serde_json::from_slice(bytes).map_err(|e| GraphError::ParseError(e.to_string()))
    }
}

/// Graph artifact errors
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Failed to parse graph artifact: {0}")]
    ParseError(String),
}

/// The unified dependency graph across all repositories
///
/// Edges have set semantics: inserting an existing edge is a no-op, which
/// makes cross-repository edge inference idempotent.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    /// All nodes, including isolated ones
    nodes: HashSet<NodeId>,

    /// Outgoing edges: producer -> consumers
    children: HashMap<NodeId, HashSet<NodeId>>,

    /// Incoming edges: consumer -> producers
    parents: HashMap<NodeId, HashSet<NodeId>>,
}

/// Result of merging repository graphs
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub graph: LineageGraph,

    /// Node ids that appeared in more than one document (data-quality
    /// warning; last definition wins on attributes)
    pub duplicate_nodes: Vec<NodeId>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an ordered sequence of graph documents into one graph
    pub fn merge(documents: impl IntoIterator<Item = GraphDocument>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for document in documents {
            for node in document.nodes {
                if !outcome.graph.add_node(node.clone()) {
                    outcome.duplicate_nodes.push(node);
                }
            }
            for (producer, consumer) in document.edges {
                outcome.graph.add_edge(producer, consumer);
            }
        }

        outcome
    }

    /// Insert a node; returns false if it was already present
    pub fn add_node(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Insert a directed edge, adding endpoints as needed;
    /// returns false if the edge was already present
    pub fn add_edge(&mut self, producer: NodeId, consumer: NodeId) -> bool {
        self.nodes.insert(producer.clone());
        self.nodes.insert(consumer.clone());

        let inserted = self
            .children
            .entry(producer.clone())
            .or_default()
            .insert(consumer.clone());
        if inserted {
            self.parents.entry(consumer).or_default().insert(producer);
        }
        inserted
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.children.values().map(HashSet::len).sum()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// All node ids, unordered
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    /// Consumers of a node (outgoing edges)
    pub fn consumers(&self, node: &str) -> impl Iterator<Item = &NodeId> {
        self.children.get(node).into_iter().flatten()
    }

    /// Producers of a node (incoming edges)
    pub fn producers(&self, node: &str) -> impl Iterator<Item = &NodeId> {
        self.parents.get(node).into_iter().flatten()
    }

    /// Number of outgoing edges
    pub fn out_degree(&self, node: &str) -> usize {
        self.children.get(node).map_or(0, HashSet::len)
    }

    /// Number of incoming edges
    pub fn in_degree(&self, node: &str) -> usize {
        self.parents.get(node).map_or(0, HashSet::len)
    }

    pub fn has_edge(&self, producer: &str, consumer: &str) -> bool {
        self.children
            .get(producer)
            .is_some_and(|consumers| consumers.contains(consumer))
    }
}
