//! Node attribute annotation
//!
//! Parses every node id in the merged graph into semantic attributes.
//! Malformed ids are skipped with a warning - they simply never match
//! during inference or extraction, so one bad id cannot sink the run.

use stalewatch_core::{Diagnostic, DiagnosticCode};
use stalewatch_dbt::{IdentifierParser, LineageGraph, NodeAttributes, NodeId};
use std::collections::HashMap;

/// Per-node attributes for the whole graph
pub type NodeAttributeMap = HashMap<NodeId, NodeAttributes>;

/// Parse attributes for every node, collecting malformed-id warnings
pub fn annotate_nodes(
    graph: &LineageGraph,
    parser: &IdentifierParser,
) -> (NodeAttributeMap, Vec<Diagnostic>) {
    let mut attributes = NodeAttributeMap::with_capacity(graph.node_count());
    let mut diagnostics = Vec::new();

    for node in graph.nodes() {
        match parser.parse(node) {
            Ok(attrs) => {
                attributes.insert(node.clone(), attrs);
            }
            Err(e) => {
                tracing::warn!(node = %node, error = %e, "skipping unparseable node id");
                diagnostics.push(Diagnostic::warn(
                    DiagnosticCode::MalformedIdentifier,
                    node.clone(),
                    e.to_string(),
                ));
            }
        }
    }

    (attributes, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalewatch_dbt::{GraphDocument, ResourceKind};

    fn graph_of(nodes: &[&str]) -> LineageGraph {
        LineageGraph::merge([GraphDocument {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            edges: vec![],
        }])
        .graph
    }

    #[test]
    fn annotates_all_valid_nodes() {
        let graph = graph_of(&["model.alpha.orders", "source.alpha.beta.customers"]);
        let parser = IdentifierParser::new(["alpha", "beta"]);

        let (attrs, diagnostics) = annotate_nodes(&graph, &parser);

        assert!(diagnostics.is_empty());
        assert_eq!(attrs.len(), 2);
        assert_eq!(
            attrs["model.alpha.orders"].resource_kind,
            ResourceKind::Model
        );
        assert_eq!(attrs["source.alpha.beta.customers"].join_key, "beta_customers");
    }

    #[test]
    fn malformed_id_is_skipped_with_warning() {
        let graph = graph_of(&["model.alpha.orders", "garbage"]);
        let parser = IdentifierParser::new(["alpha"]);

        let (attrs, diagnostics) = annotate_nodes(&graph, &parser);

        assert_eq!(attrs.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::MalformedIdentifier);
        assert_eq!(diagnostics[0].subject.as_deref(), Some("garbage"));
    }
}
