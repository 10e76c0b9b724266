use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project workspace known to the view selector.
///
/// Items are shared between features as `Arc<ProjectItem>`; the dirty flag is
/// the only mutable part, toggled by whoever edits the project.
#[derive(Debug)]
pub struct ProjectItem {
    pub id: Uuid,
    pub title: String,
    pub path: PathBuf,
    pub kind: ProjectKind,
    dirty: AtomicBool,
}

impl ProjectItem {
    pub fn new(title: impl Into<String>, path: impl Into<PathBuf>, kind: ProjectKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            path: path.into(),
            kind,
            dirty: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn mark_saved(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }
}

/// The kind of a project, which decides the published view that hosts it.
///
/// - `Workspace`: a plain folder opened from disk or created empty
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Workspace,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "workspace" => Some(Self::Workspace),
            _ => None,
        }
    }

    /// Name of the published view that renders this kind of project.
    pub fn view_name(&self) -> &'static str {
        match self {
            Self::Workspace => "PROJECT.Main",
        }
    }
}
