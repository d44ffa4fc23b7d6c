//! Cross-repository edge inference
//!
//! Independently built pipelines cannot reference each other's node ids, so
//! a table produced in repo B surfaces in repo A only as a source
//! declaration. Matching join keys recover the relationship: for every
//! source node, an edge is added to every other node sharing its key.
//!
//! Nodes are bucketed by join key first; within a bucket this is the same
//! edge set as the all-pairs rule, without scanning non-matching pairs.
//! Idempotent: the graph's set-semantics edges collapse re-runs.

use crate::annotate::NodeAttributeMap;
use stalewatch_dbt::{LineageGraph, NodeId, ResourceKind};
use std::collections::HashMap;

/// Add inferred producer edges; returns the number of new edges
pub fn infer_edges(graph: &mut LineageGraph, attributes: &NodeAttributeMap) -> usize {
    let mut by_key: HashMap<&str, Vec<&NodeId>> = HashMap::new();
    for (node, attrs) in attributes {
        by_key.entry(attrs.join_key.as_str()).or_default().push(node);
    }

    let mut added = 0;
    for bucket in by_key.values() {
        if bucket.len() < 2 {
            continue;
        }
        for &source in bucket {
            if attributes[source].resource_kind != ResourceKind::Source {
                continue;
            }
            for &other in bucket {
                if other != source && graph.add_edge(source.clone(), other.clone()) {
                    tracing::debug!(from = %source, to = %other, "inferred cross-repository edge");
                    added += 1;
                }
            }
        }
    }

    added
}
