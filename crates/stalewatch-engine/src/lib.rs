//! Stalewatch engine - the orphaned-table scan pipeline
//!
//! Phases, in order: merge per-repository lineage graphs, annotate node
//! attributes, infer cross-repository edges via join keys, extract leaf
//! model candidates, evaluate query-log usage, assemble the report. The
//! graph is built once and only read after inference; collaborator I/O
//! (artifact fetch, usage queries) is async but the pass is sequential.

pub mod annotate;
pub mod evaluate;
pub mod extract;
pub mod infer;
pub mod run;

pub use annotate::{annotate_nodes, NodeAttributeMap};
pub use evaluate::{evaluate, EvaluatedCandidate, EvaluationOutcome, UsageClassification};
pub use extract::{find_orphan_candidates, Candidate};
pub use infer::infer_edges;
pub use run::OrphanScan;
