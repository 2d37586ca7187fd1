//! Workspace domain model.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Relative path of the generated source inside the structural region.
pub const MAIN_SOURCE_PATH: &str = "src/main/scala/Main.scala";
/// Directory the structural compiler emits its description into.
pub const GENERATED_DIR: &str = "generated";
/// Name of the low-level region.
pub const LOWLEVEL_DIR: &str = "iv";

/// An isolated filesystem sandbox backing stage execution.
///
/// The structural region is the workspace root (a copy of the project
/// template); the low-level region is its `iv/` subdirectory. Workspaces are
/// not `Clone`: the holder has exclusive use of the directory until release.
#[derive(Debug, PartialEq, Eq)]
pub struct Workspace {
    id: Uuid,
    root: PathBuf,
}

impl Workspace {
    pub fn new(id: Uuid, root: impl Into<PathBuf>) -> Self {
        Self {
            id,
            root: root.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the structural compiler runs.
    pub fn structural_dir(&self) -> &Path {
        &self.root
    }

    /// Where the low-level compiler and simulator run.
    pub fn lowlevel_dir(&self) -> PathBuf {
        self.root.join(LOWLEVEL_DIR)
    }

    pub fn main_source(&self) -> PathBuf {
        self.root.join(MAIN_SOURCE_PATH)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.root.join(GENERATED_DIR)
    }
}
