//! Artifact store collaborator
//!
//! Each repository publishes two artifacts under its prod prefix: the
//! serialized dependency graph and the manifest. Retrieval transport is a
//! collaborator concern; this crate only fixes the interface and ships a
//! directory-backed store plus an in-memory mock for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Path of the serialized dependency graph within a repository prefix
pub const GRAPH_ARTIFACT: &str = "prod/graph.json";

/// Path of the manifest within a repository prefix
pub const MANIFEST_ARTIFACT: &str = "prod/manifest.json";

/// Artifact retrieval errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact '{path}' not found for repository '{repository}'")]
    NotFound { repository: String, path: String },

    #[error("Failed to read artifact '{path}' for repository '{repository}': {reason}")]
    ReadError {
        repository: String,
        path: String,
        reason: String,
    },
}

/// Trait for artifact stores that can fetch repository artifacts
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetch an artifact's raw bytes
    async fn fetch(&self, repository: &str, path: &str) -> Result<Vec<u8>, ArtifactError>;
}

/// Directory-backed artifact store
///
/// Expects the layout `<root>/<repository>/prod/{graph.json,manifest.json}`,
/// mirroring the per-repository prefixes of the production bucket.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalStore {
    async fn fetch(&self, repository: &str, path: &str) -> Result<Vec<u8>, ArtifactError> {
        let full_path = self.root.join(repository).join(path);

        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::NotFound {
                repository: repository.to_string(),
                path: path.to_string(),
            }),
            Err(e) => Err(ArtifactError::ReadError {
                repository: repository.to_string(),
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// In-memory artifact store for tests
///
/// Stores artifacts keyed by `<repository>/<path>` and can inject read
/// failures per repository to exercise partial-run behavior.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    artifacts: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing_repositories: Arc<RwLock<HashMap<String, String>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact for a repository
    pub async fn put(&self, repository: &str, path: &str, bytes: impl Into<Vec<u8>>) {
        self.artifacts
            .write()
            .await
            .insert(format!("{}/{}", repository, path), bytes.into());
    }

    /// Make every fetch for a repository fail with the given reason
    pub async fn fail_repository(&self, repository: &str, reason: &str) {
        self.failing_repositories
            .write()
            .await
            .insert(repository.to_string(), reason.to_string());
    }
}

#[async_trait::async_trait]
impl ArtifactStore for MockStore {
    async fn fetch(&self, repository: &str, path: &str) -> Result<Vec<u8>, ArtifactError> {
        if let Some(reason) = self.failing_repositories.read().await.get(repository) {
            return Err(ArtifactError::ReadError {
                repository: repository.to_string(),
                path: path.to_string(),
                reason: reason.clone(),
            });
        }

        self.artifacts
            .read()
            .await
            .get(&format!("{}/{}", repository, path))
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound {
                repository: repository.to_string(),
                path: path.to_string(),
            })
    }
}
