//! Leaf model extraction
//!
//! After inference the graph is fully stitched; a model with zero outgoing
//! edges has no downstream consumer anywhere, in any repository. Each such
//! model resolves to its physical relation through its own repository's
//! manifest. A missing or incomplete manifest entry skips that candidate
//! with a warning rather than aborting the run, so partial results survive
//! data-quality inconsistencies.

use crate::annotate::NodeAttributeMap;
use stalewatch_core::{Diagnostic, DiagnosticCode};
use stalewatch_dbt::{LineageGraph, Manifest, NodeId, RelationRef, ResourceKind};
use std::collections::HashMap;

/// A leaf model resolved to its physical warehouse relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub node_id: NodeId,
    pub relation: RelationRef,
}

/// Find all orphan candidates: kind-model nodes with out-degree zero
///
/// `manifests` maps repository id to that repository's manifest. Output is
/// sorted by node id for stable reports.
pub fn find_orphan_candidates(
    graph: &LineageGraph,
    attributes: &NodeAttributeMap,
    manifests: &HashMap<String, Manifest>,
) -> (Vec<Candidate>, Vec<Diagnostic>) {
    let mut candidates = Vec::new();
    let mut diagnostics = Vec::new();

    for (node, attrs) in attributes {
        if attrs.resource_kind != ResourceKind::Model || graph.out_degree(node) > 0 {
            continue;
        }

        let Some(manifest) = manifests.get(&attrs.owning_repository) else {
            // Repository failed to load earlier; already reported there
            continue;
        };

        match manifest.lookup(node) {
            Ok(relation) => {
                tracing::debug!(node = %node, alias = %relation.alias, "leaf model candidate");
                candidates.push(Candidate {
                    node_id: node.clone(),
                    relation,
                });
            }
            Err(e) => {
                tracing::warn!(node = %node, error = %e, "skipping candidate without manifest entry");
                diagnostics.push(Diagnostic::warn(
                    DiagnosticCode::ManifestLookupFailed,
                    node.clone(),
                    e.to_string(),
                ));
            }
        }
    }

    candidates.sort_by(|a, b| a.node_id.cmp(&b.node_id));
    (candidates, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate_nodes;
    use stalewatch_dbt::{GraphDocument, IdentifierParser, ManifestNode};

    fn manifest_for(nodes: &[&str]) -> Manifest {
        let mut manifest = Manifest::default();
        for node in nodes {
            let alias = node.rsplit('.').next().unwrap().to_string();
            manifest.nodes.insert(
                node.to_string(),
                ManifestNode {
                    database: Some("acme-prod".into()),
                    schema: Some("analytics".into()),
                    alias: Some(alias),
                },
            );
        }
        manifest
    }

    fn setup(nodes: &[&str], edges: &[(&str, &str)]) -> (LineageGraph, NodeAttributeMap) {
        let graph = LineageGraph::merge([GraphDocument {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            edges: edges
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        }])
        .graph;
        let parser = IdentifierParser::new(["alpha"]);
        let (attrs, _) = annotate_nodes(&graph, &parser);
        (graph, attrs)
    }

    #[test]
    fn selects_models_with_zero_out_degree() {
        // A -> B, C isolated: B and C are leaves, A is not
        let (graph, attrs) = setup(
            &["model.alpha.a", "model.alpha.b", "model.alpha.c"],
            &[("model.alpha.a", "model.alpha.b")],
        );
        let manifests = HashMap::from([(
            "alpha".to_string(),
            manifest_for(&["model.alpha.a", "model.alpha.b", "model.alpha.c"]),
        )]);

        let (candidates, diagnostics) = find_orphan_candidates(&graph, &attrs, &manifests);

        assert!(diagnostics.is_empty());
        let ids: Vec<_> = candidates.iter().map(|c| c.node_id.as_str()).collect();
        assert_eq!(ids, vec!["model.alpha.b", "model.alpha.c"]);
    }

    #[test]
    fn non_model_leaves_are_ignored() {
        let (graph, attrs) = setup(&["seed.alpha.lookup", "model.alpha.m"], &[]);
        let manifests = HashMap::from([(
            "alpha".to_string(),
            manifest_for(&["seed.alpha.lookup", "model.alpha.m"]),
        )]);

        let (candidates, _) = find_orphan_candidates(&graph, &attrs, &manifests);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].node_id, "model.alpha.m");
    }

    #[test]
    fn missing_manifest_entry_skips_with_warning() {
        let (graph, attrs) = setup(&["model.alpha.known", "model.alpha.ghost"], &[]);
        let manifests = HashMap::from([(
            "alpha".to_string(),
            manifest_for(&["model.alpha.known"]),
        )]);

        let (candidates, diagnostics) = find_orphan_candidates(&graph, &attrs, &manifests);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].node_id, "model.alpha.known");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::ManifestLookupFailed);
        assert_eq!(diagnostics[0].subject.as_deref(), Some("model.alpha.ghost"));
    }

    #[test]
    fn candidate_resolves_physical_relation() {
        let (graph, attrs) = setup(&["model.alpha.orders"], &[]);
        let manifests = HashMap::from([(
            "alpha".to_string(),
            manifest_for(&["model.alpha.orders"]),
        )]);

        let (candidates, _) = find_orphan_candidates(&graph, &attrs, &manifests);
        assert_eq!(
            candidates[0].relation,
            RelationRef {
                database: "acme-prod".into(),
                schema: "analytics".into(),
                alias: "orders".into(),
            }
        );
    }
}
