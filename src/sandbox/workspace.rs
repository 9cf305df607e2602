//! Per-request scratch directories.
//!
//! Every request gets its own uniquely named directory holding the source file
//! and whatever the toolchain derives from it. The directory is removed by
//! [`Workspace::release`], or by `Drop` when the owning future is cancelled or
//! an error short-circuits the request.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::Result;

const WORKSPACE_PREFIX: &str = "coderun-";

/// Allocates workspaces under a fixed root (the system temp dir by default).
#[derive(Debug, Clone, Default)]
pub struct WorkspaceManager {
    root: Option<PathBuf>,
}

impl WorkspaceManager {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Write `source` to a freshly named file with the given extension.
    pub async fn acquire(&self, source: &str, extension: &str) -> Result<Workspace> {
        let stem = format!("main_{}", uuid::Uuid::new_v4().simple());
        self.acquire_named(source, &stem, extension).await
    }

    /// Like [`acquire`](Self::acquire), but with a caller-chosen file stem.
    /// Uniqueness comes from the enclosing directory.
    pub async fn acquire_named(&self, source: &str, stem: &str, extension: &str) -> Result<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match &self.root {
            Some(root) => {
                tokio::fs::create_dir_all(root).await?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        let source_path = dir.path().join(format!("{}{}", stem, extension));
        // `dir` is dropped (and removed) if the write fails
        tokio::fs::write(&source_path, source).await?;

        debug!(
            dir = %dir.path().display(),
            source = %source_path.display(),
            bytes = source.len(),
            "Acquired workspace"
        );

        Ok(Workspace {
            dir: Some(dir),
            stem: stem.to_string(),
            source_path,
        })
    }
}

/// One request's source file plus derived artifacts.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    stem: String,
    source_path: PathBuf,
}

impl Workspace {
    pub fn dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Artifact path sharing the source's stem, e.g. `derived_path(".class")`.
    pub fn derived_path(&self, suffix: &str) -> PathBuf {
        self.dir().join(format!("{}{}", self.stem, suffix))
    }

    /// Remove the source, derived artifacts and anything nested beside them.
    /// Failures are logged, never returned.
    pub fn release(mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(dir = %path.display(), "Released workspace"),
                Err(e) => warn!(dir = %path.display(), error = %e, "Failed to remove workspace"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_writes_source() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        let workspace = manager.acquire("print(1)\n", ".py").await.unwrap();
        assert!(workspace.source_path().starts_with(root.path()));
        assert_eq!(
            std::fs::read_to_string(workspace.source_path()).unwrap(),
            "print(1)\n"
        );
        assert_eq!(
            workspace.source_path().extension().and_then(|e| e.to_str()),
            Some("py")
        );
    }

    #[tokio::test]
    async fn test_derived_path_shares_stem() {
        let manager = WorkspaceManager::default();
        let workspace = manager
            .acquire_named("class A {}", "Sol", ".java")
            .await
            .unwrap();

        assert_eq!(workspace.derived_path(".class"), workspace.dir().join("Sol.class"));
        assert_eq!(workspace.source_path(), workspace.dir().join("Sol.java"));
        workspace.release();
    }

    #[tokio::test]
    async fn test_release_removes_nested_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        let workspace = manager.acquire("int main(){}", ".cpp").await.unwrap();
        std::fs::write(workspace.derived_path(""), b"binary").unwrap();
        std::fs::create_dir(workspace.dir().join("pkg")).unwrap();
        std::fs::write(workspace.dir().join("pkg").join("Inner$1.class"), b"x").unwrap();

        workspace.release();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_workspace() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        {
            let _workspace = manager.acquire("x = 1", ".py").await.unwrap();
            assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
        }
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_identical_sources_get_distinct_workspaces() {
        let manager = WorkspaceManager::default();
        let a = manager.acquire("same", ".py").await.unwrap();
        let b = manager.acquire("same", ".py").await.unwrap();
        assert_ne!(a.dir(), b.dir());
        assert_ne!(a.source_path(), b.source_path());
        a.release();
        b.release();
    }
}
