//! dbt-facing parsing for stalewatch
//!
//! Node identifier decoding, lineage graph artifacts, the manifest subset
//! used for physical relation lookup, and the artifact store interface.

pub mod artifact;
pub mod graph;
pub mod identifier;
pub mod manifest;

pub use artifact::{ArtifactError, ArtifactStore, LocalStore, MockStore, GRAPH_ARTIFACT, MANIFEST_ARTIFACT};
pub use graph::{GraphDocument, GraphError, LineageGraph, MergeOutcome, NodeId};
pub use identifier::{IdentifierError, IdentifierParser, NodeAttributes, ResourceKind};
pub use manifest::{Manifest, ManifestError, ManifestNode, RelationRef};
