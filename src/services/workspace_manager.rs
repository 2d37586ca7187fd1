//! Workspace Manager
//!
//! Allocates isolated filesystem sandboxes for repair sessions. Each
//! workspace is a fresh copy of a static project template under a directory
//! named with a random UUID, so concurrently running sessions never share a
//! path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::workspace::{LOWLEVEL_DIR, MAIN_SOURCE_PATH};
use crate::domain::models::{Workspace, WorkspaceConfig};

/// Service for allocating and releasing workspaces.
///
/// # Layout
///
/// - Workspace root: `<root>/<uuid>` (copy of the template, structural region)
/// - Low-level region: `<root>/<uuid>/iv`
pub struct WorkspaceManager {
    root: PathBuf,
    cleanup: bool,
    active: Arc<RwLock<HashSet<Uuid>>>,
}

impl WorkspaceManager {
    /// Create a manager that allocates workspaces under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cleanup: true,
            active: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(&config.root).with_cleanup(config.cleanup)
    }

    /// Keep workspace directories on release when `false`.
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of workspaces currently handed out.
    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Allocate a new workspace seeded from `template`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] if the template is missing or
    /// the copy fails.
    #[instrument(skip(self), fields(root = %self.root.display(), template = %template.display()))]
    pub async fn acquire(&self, template: &Path) -> DomainResult<Workspace> {
        if !template.is_dir() {
            return Err(DomainError::Infrastructure(format!(
                "Workspace template not found: {}",
                template.display()
            )));
        }

        let id = Uuid::new_v4();
        let path = self.root.join(id.simple().to_string());
        let template = template.to_path_buf();
        let target = path.clone();

        tokio::task::spawn_blocking(move || provision(&template, &target))
            .await
            .map_err(|e| DomainError::Infrastructure(format!("Provisioning task failed: {e}")))??;

        self.active.write().await.insert(id);
        info!(workspace_id = %id, path = %path.display(), "Workspace acquired");

        Ok(Workspace::new(id, path))
    }

    /// Release a workspace, removing its directory when cleanup is enabled.
    #[instrument(skip(self, workspace), fields(workspace_id = %workspace.id()))]
    pub async fn release(&self, workspace: Workspace) -> DomainResult<()> {
        let removed = self.active.write().await.remove(&workspace.id());
        if !removed {
            warn!("Releasing a workspace this manager did not hand out");
        }

        if self.cleanup {
            match tokio::fs::remove_dir_all(workspace.root()).await {
                Ok(()) => debug!(path = %workspace.root().display(), "Workspace removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!("Workspace released");
        Ok(())
    }
}

/// Copy the template tree into a brand-new directory and create both
/// regions.
fn provision(template: &Path, target: &Path) -> DomainResult<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // `create_dir` (not `_all`) so a colliding id fails instead of sharing.
    std::fs::create_dir(target)?;

    for entry in WalkDir::new(template).min_depth(1) {
        let entry = entry.map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(template)
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &destination)?;
        }
    }

    std::fs::create_dir_all(target.join(LOWLEVEL_DIR))?;
    if let Some(source_dir) = target.join(MAIN_SOURCE_PATH).parent() {
        std::fs::create_dir_all(source_dir)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("build.sbt"), "scalaVersion := \"2.13.12\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join("project")).unwrap();
        std::fs::write(dir.path().join("project/build.properties"), "sbt.version=1.9.7\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn acquire_copies_template_and_creates_regions() {
        let template = template();
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());

        let ws = manager.acquire(template.path()).await.unwrap();

        assert!(ws.root().starts_with(root.path()));
        assert!(ws.root().join("build.sbt").is_file());
        assert!(ws.root().join("project/build.properties").is_file());
        assert!(ws.lowlevel_dir().is_dir());
        assert!(ws.main_source().parent().unwrap().is_dir());
        assert_eq!(manager.active_count().await, 1);

        let path = ws.root().to_path_buf();
        manager.release(ws).await.unwrap();
        assert!(!path.exists());
        assert_eq!(manager.active_count().await, 0);
    }

    #[tokio::test]
    async fn workspaces_never_share_paths() {
        let template = template();
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());

        let a = manager.acquire(template.path()).await.unwrap();
        let b = manager.acquire(template.path()).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.root(), b.root());
        assert_eq!(manager.active_count().await, 2);
    }

    #[tokio::test]
    async fn missing_template_is_infrastructure_error() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());

        let err = manager
            .acquire(&root.path().join("does-not-exist"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn release_without_cleanup_keeps_directory() {
        let template = template();
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path()).with_cleanup(false);

        let ws = manager.acquire(template.path()).await.unwrap();
        let path = ws.root().to_path_buf();
        manager.release(ws).await.unwrap();

        assert!(path.join("build.sbt").is_file());
    }
}
