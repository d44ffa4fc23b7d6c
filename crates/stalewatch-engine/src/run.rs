//! One-shot scan orchestration
//!
//! Drives the full batch pass: load per-repository artifacts, fold-merge
//! the graphs, annotate node attributes, infer cross-repository edges,
//! extract leaf model candidates, evaluate usage, and assemble the report.
//! A repository that fails to load drops out of the scan with an error
//! diagnostic; the remaining repositories still produce results.

use crate::annotate::annotate_nodes;
use crate::evaluate::{evaluate, UsageClassification};
use crate::extract::find_orphan_candidates;
use crate::infer::infer_edges;
use stalewatch_catalog::UsageAdapter;
use stalewatch_core::{
    Config, Diagnostic, DiagnosticCode, OrphanRecord, OrphanReport, UnknownUsageRecord,
};
use stalewatch_dbt::{
    ArtifactStore, GraphDocument, IdentifierParser, LineageGraph, Manifest, GRAPH_ARTIFACT,
    MANIFEST_ARTIFACT,
};
use std::collections::HashMap;

/// Artifacts successfully loaded for the scan
struct LoadedRepositories {
    graphs: Vec<GraphDocument>,
    manifests: HashMap<String, Manifest>,
    loaded: usize,
    diagnostics: Vec<Diagnostic>,
}

/// The orphaned-table scan
pub struct OrphanScan<'a> {
    config: &'a Config,
    store: &'a dyn ArtifactStore,
}

impl<'a> OrphanScan<'a> {
    pub fn new(config: &'a Config, store: &'a dyn ArtifactStore) -> Self {
        Self { config, store }
    }

    /// Run the full pipeline and produce the report
    pub async fn run(&self, adapter: &dyn UsageAdapter) -> OrphanReport {
        let mut report = OrphanReport::new(self.config.window_days);

        let loaded = self.load_repositories().await;
        report.summary.repositories_loaded = loaded.loaded;
        report.summary.repositories_failed = self.config.repositories.len() - loaded.loaded;
        report.diagnostics.extend(loaded.diagnostics);

        let (_graph, candidates) =
            self.stitch_and_extract(loaded.graphs, &loaded.manifests, &mut report);

        tracing::info!(
            candidates = candidates.len(),
            window_days = self.config.window_days,
            "evaluating candidate usage"
        );

        let outcome = evaluate(candidates, adapter, self.config.window_days, self.config.retry).await;
        report.diagnostics.extend(outcome.diagnostics.iter().cloned());

        for evaluated in &outcome.evaluated {
            match &evaluated.classification {
                UsageClassification::Orphaned => {
                    let relation = &evaluated.candidate.relation;
                    report.orphans.push(OrphanRecord {
                        database: relation.database.clone(),
                        schema: relation.schema.clone(),
                        alias: relation.alias.clone(),
                        node_name: evaluated.candidate.node_id.clone(),
                        query_count: 0,
                        user_count: 0,
                    });
                }
                UsageClassification::Unknown { reason } => {
                    let relation = &evaluated.candidate.relation;
                    report.unknown.push(UnknownUsageRecord {
                        database: relation.database.clone(),
                        schema: relation.schema.clone(),
                        alias: relation.alias.clone(),
                        node_name: evaluated.candidate.node_id.clone(),
                        reason: reason.clone(),
                    });
                }
                UsageClassification::Active => {}
            }
        }

        report.orphans.sort_by(|a, b| a.node_name.cmp(&b.node_name));
        report.unknown.sort_by(|a, b| a.node_name.cmp(&b.node_name));
        report.summary.orphans = report.orphans.len();
        report.summary.unknown_usage = report.unknown.len();
        report.summary.skipped = report
            .diagnostics
            .iter()
            .filter(|d| {
                matches!(
                    d.code,
                    DiagnosticCode::MalformedIdentifier | DiagnosticCode::ManifestLookupFailed
                )
            })
            .count();

        report
    }

    /// Run the pipeline up to candidate extraction, without warehouse access
    pub async fn candidates_only(&self) -> (Vec<crate::extract::Candidate>, OrphanReport) {
        let mut report = OrphanReport::new(self.config.window_days);

        let loaded = self.load_repositories().await;
        report.summary.repositories_loaded = loaded.loaded;
        report.summary.repositories_failed = self.config.repositories.len() - loaded.loaded;
        report.diagnostics.extend(loaded.diagnostics);

        let (_, candidates) =
            self.stitch_and_extract(loaded.graphs, &loaded.manifests, &mut report);

        (candidates, report)
    }

    /// Merge, annotate, infer and extract; fills in the graph-phase summary
    fn stitch_and_extract(
        &self,
        graphs: Vec<GraphDocument>,
        manifests: &HashMap<String, Manifest>,
        report: &mut OrphanReport,
    ) -> (LineageGraph, Vec<crate::extract::Candidate>) {
        let merge = LineageGraph::merge(graphs);
        let mut graph = merge.graph;
        for node in merge.duplicate_nodes {
            report.diagnostics.push(Diagnostic::warn(
                DiagnosticCode::DuplicateNode,
                node.clone(),
                format!("node '{}' defined by more than one repository graph", node),
            ));
        }

        let parser = IdentifierParser::new(self.config.repositories.iter().cloned());
        let (attributes, diagnostics) = annotate_nodes(&graph, &parser);
        report.diagnostics.extend(diagnostics);

        let inferred = infer_edges(&mut graph, &attributes);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            inferred,
            "stitched lineage graph"
        );

        report.summary.nodes = graph.node_count();
        report.summary.edges_inferred = inferred;

        let (candidates, diagnostics) = find_orphan_candidates(&graph, &attributes, manifests);
        report.diagnostics.extend(diagnostics);
        report.summary.candidates = candidates.len();

        (graph, candidates)
    }

    /// Fetch and parse both artifacts for every configured repository
    async fn load_repositories(&self) -> LoadedRepositories {
        let mut graphs = Vec::new();
        let mut manifests = HashMap::new();
        let mut loaded = 0;
        let mut diagnostics = Vec::new();

        for repository in &self.config.repositories {
            match self.load_one(repository).await {
                Ok((graph, manifest)) => {
                    graphs.push(graph);
                    manifests.insert(repository.clone(), manifest);
                    loaded += 1;
                }
                Err(reason) => {
                    tracing::error!(repository = %repository, %reason, "repository dropped from scan");
                    diagnostics.push(Diagnostic::error(
                        DiagnosticCode::RepositoryLoadFailed,
                        repository.clone(),
                        reason,
                    ));
                }
            }
        }

        LoadedRepositories {
            graphs,
            manifests,
            loaded,
            diagnostics,
        }
    }

    async fn load_one(&self, repository: &str) -> Result<(GraphDocument, Manifest), String> {
        let graph_bytes = self
            .store
            .fetch(repository, GRAPH_ARTIFACT)
            .await
            .map_err(|e| e.to_string())?;
        let graph = GraphDocument::from_bytes(&graph_bytes).map_err(|e| e.to_string())?;

        let manifest_bytes = self
            .store
            .fetch(repository, MANIFEST_ARTIFACT)
            .await
            .map_err(|e| e.to_string())?;
        let manifest = Manifest::from_bytes(&manifest_bytes).map_err(|e| e.to_string())?;

        Ok((graph, manifest))
    }
}
