//! End-to-end scan tests over mock collaborators
//!
//! Two repositories: "alpha" declares repo-beta's customers table as a
//! source; "beta" materializes it as a model. The scan must stitch that
//! relationship and classify leaf models by observed usage.

use pretty_assertions::assert_eq;
use serde_json::json;
use stalewatch_core::{Config, DiagnosticCode, RetryPolicy};
use stalewatch_catalog::{MockAdapter, TableIdentifier, UsageError};
use stalewatch_dbt::{MockStore, GRAPH_ARTIFACT, MANIFEST_ARTIFACT};
use stalewatch_engine::OrphanScan;

fn scan_config() -> Config {
    Config {
        repositories: vec!["alpha".into(), "beta".into()],
        window_days: 30,
        retry: RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1,
        },
        ..Config::default()
    }
}

async fn seed_two_repositories(store: &MockStore) {
    // alpha: orders model reads the cross-repo customers source
    let alpha_graph = json!({
        "nodes": ["model.alpha.orders", "source.alpha.beta.customers"],
        "edges": [["source.alpha.beta.customers", "model.alpha.orders"]]
    });
    let alpha_manifest = json!({
        "nodes": {
            "model.alpha.orders": {
                "database": "acme-prod", "schema": "analytics", "alias": "orders"
            }
        }
    });

    // beta: customers model with no downstream consumer of its own
    let beta_graph = json!({
        "nodes": ["model.beta.customers"],
        "edges": []
    });
    let beta_manifest = json!({
        "nodes": {
            "model.beta.customers": {
                "database": "acme-prod", "schema": "core", "alias": "customers"
            }
        }
    });

    store.put("alpha", GRAPH_ARTIFACT, alpha_graph.to_string()).await;
    store.put("alpha", MANIFEST_ARTIFACT, alpha_manifest.to_string()).await;
    store.put("beta", GRAPH_ARTIFACT, beta_graph.to_string()).await;
    store.put("beta", MANIFEST_ARTIFACT, beta_manifest.to_string()).await;
}

#[tokio::test]
async fn cross_repository_scan_finds_unused_leaves() {
    let store = MockStore::new();
    seed_two_repositories(&store).await;

    let adapter = MockAdapter::new();
    // orders is actively queried; customers is not
    adapter.set_counts_for("acme-prod", "analytics", "orders", 12, 4).await;

    let config = scan_config();
    let report = OrphanScan::new(&config, &store).run(&adapter).await;

    assert_eq!(report.summary.repositories_loaded, 2);
    assert_eq!(report.summary.repositories_failed, 0);
    assert_eq!(report.summary.nodes, 3);
    // source.alpha.beta.customers -> model.beta.customers
    assert_eq!(report.summary.edges_inferred, 1);

    // Both models have zero out-degree (the alpha source keeps its original
    // consumer edge; the inferred edge lands on the beta model's inbound side)
    assert_eq!(report.summary.candidates, 2);

    // Only the unqueried one survives usage evaluation
    assert_eq!(report.summary.orphans, 1);
    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].node_name, "model.beta.customers");
    assert_eq!(report.orphans[0].database, "acme-prod");
    assert_eq!(report.orphans[0].schema, "core");
    assert_eq!(report.orphans[0].alias, "customers");
    assert_eq!(report.orphans[0].query_count, 0);
    assert_eq!(report.orphans[0].user_count, 0);
}

#[tokio::test]
async fn candidates_only_skips_warehouse_access() {
    let store = MockStore::new();
    seed_two_repositories(&store).await;

    let config = scan_config();
    let (candidates, report) = OrphanScan::new(&config, &store).candidates_only().await;

    let ids: Vec<_> = candidates.iter().map(|c| c.node_id.as_str()).collect();
    assert_eq!(ids, vec!["model.alpha.orders", "model.beta.customers"]);
    assert_eq!(report.summary.candidates, 2);
    assert_eq!(report.summary.orphans, 0);
}

#[tokio::test]
async fn failed_repository_does_not_abort_the_run() {
    let store = MockStore::new();
    seed_two_repositories(&store).await;
    store.fail_repository("beta", "bucket unavailable").await;

    let adapter = MockAdapter::new();
    let config = scan_config();
    let report = OrphanScan::new(&config, &store).run(&adapter).await;

    assert_eq!(report.summary.repositories_loaded, 1);
    assert_eq!(report.summary.repositories_failed, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::RepositoryLoadFailed
            && d.subject.as_deref() == Some("beta")));

    // alpha still contributes: its orders model is an unqueried leaf
    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].node_name, "model.alpha.orders");
}

#[tokio::test]
async fn usage_failures_surface_as_unknown() {
    let store = MockStore::new();
    seed_two_repositories(&store).await;

    let adapter = MockAdapter::new();
    let customers = TableIdentifier::new("acme-prod", "core", "customers");
    for _ in 0..2 {
        adapter
            .push_error(&customers, UsageError::Timeout("deadline".into()))
            .await;
    }

    let config = scan_config();
    let report = OrphanScan::new(&config, &store).run(&adapter).await;

    // customers exhausted its retries: unknown, never zero
    assert_eq!(report.summary.unknown_usage, 1);
    assert_eq!(report.unknown[0].node_name, "model.beta.customers");

    // orders was confirmed quiet
    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].node_name, "model.alpha.orders");

    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::UsageQueryFailed));
}

#[tokio::test]
async fn malformed_ids_and_missing_manifest_entries_degrade_gracefully() {
    let store = MockStore::new();

    let graph = json!({
        "nodes": ["model.alpha.orders", "model.alpha.ghost", "bogus", "model.alpha"],
        "edges": []
    });
    let manifest = json!({
        "nodes": {
            "model.alpha.orders": {
                "database": "acme-prod", "schema": "analytics", "alias": "orders"
            }
        }
    });
    store.put("alpha", GRAPH_ARTIFACT, graph.to_string()).await;
    store.put("alpha", MANIFEST_ARTIFACT, manifest.to_string()).await;

    let adapter = MockAdapter::new();
    let config = Config {
        repositories: vec!["alpha".into()],
        retry: RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 1,
        },
        ..Config::default()
    };
    let report = OrphanScan::new(&config, &store).run(&adapter).await;

    // Two malformed ids plus one candidate without a manifest entry
    let malformed = report
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::MalformedIdentifier)
        .count();
    assert_eq!(malformed, 2);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::ManifestLookupFailed
            && d.subject.as_deref() == Some("model.alpha.ghost")));
    assert_eq!(report.summary.skipped, 3);

    // The well-formed, unqueried model still comes out
    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].node_name, "model.alpha.orders");
}

#[tokio::test]
async fn duplicate_node_across_repositories_warns() {
    let store = MockStore::new();
    seed_two_repositories(&store).await;

    // beta's graph also lists alpha's orders model
    let beta_graph = json!({
        "nodes": ["model.beta.customers", "model.alpha.orders"],
        "edges": []
    });
    store.put("beta", GRAPH_ARTIFACT, beta_graph.to_string()).await;

    let adapter = MockAdapter::new();
    let config = scan_config();
    let report = OrphanScan::new(&config, &store).run(&adapter).await;

    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::DuplicateNode
            && d.subject.as_deref() == Some("model.alpha.orders")));
    // Still a single node in the merged graph
    assert_eq!(report.summary.nodes, 3);
}
