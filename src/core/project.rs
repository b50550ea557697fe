//! Project inventory model
//!
//! A [`ProjectNode`] is one discovered directory and its position in the
//! ecosystem hierarchy. Nodes are produced by discovery and never mutated
//! afterwards.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Position of a project in the ecosystem hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    /// Project that is not part of an ecosystem
    StandaloneProject,
    /// Worktree of a standalone project
    StandaloneProjectWorktree,
    /// Root repository of an ecosystem
    EcosystemRoot,
    /// Member project of an ecosystem root
    EcosystemSubProject,
    /// Worktree of a member project
    EcosystemSubProjectWorktree,
    /// Worktree copy of the whole ecosystem
    EcosystemWorktree,
    /// Member project inside an ecosystem worktree
    EcosystemWorktreeSubProject,
    /// Worktree of a member project inside an ecosystem worktree
    EcosystemWorktreeSubProjectWorktree,
}

impl ProjectKind {
    /// Meta-projects group other projects and are never built themselves
    pub fn is_meta(self) -> bool {
        matches!(self, Self::EcosystemRoot | Self::EcosystemWorktree)
    }

    /// Whether this kind lives inside an ecosystem worktree
    pub fn is_worktree_member(self) -> bool {
        matches!(
            self,
            Self::EcosystemWorktreeSubProject | Self::EcosystemWorktreeSubProjectWorktree
        )
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::StandaloneProject => "standalone",
            Self::StandaloneProjectWorktree => "standalone-worktree",
            Self::EcosystemRoot => "ecosystem-root",
            Self::EcosystemSubProject => "sub-project",
            Self::EcosystemSubProjectWorktree => "sub-project-worktree",
            Self::EcosystemWorktree => "ecosystem-worktree",
            Self::EcosystemWorktreeSubProject => "worktree-sub-project",
            Self::EcosystemWorktreeSubProjectWorktree => "worktree-sub-project-worktree",
        };
        f.write_str(label)
    }
}

/// A discovered project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectNode {
    /// Absolute project directory
    pub path: PathBuf,
    /// Scope root owning this node (ecosystem root, ecosystem worktree or standalone project)
    pub parent_scope: Option<PathBuf>,
    /// Hierarchy position
    pub kind: ProjectKind,
}

impl ProjectNode {
    /// Create a node
    pub fn new(path: impl Into<PathBuf>, parent_scope: Option<PathBuf>, kind: ProjectKind) -> Self {
        Self {
            path: path.into(),
            parent_scope,
            kind,
        }
    }

    /// Job name: the directory basename
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Whether `scope` is this node's owning scope root
    pub fn belongs_to(&self, scope: &Path) -> bool {
        self.parent_scope.as_deref() == Some(scope)
    }
}

/// Everything discovery found for one invocation
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Discovered nodes, in discovery order
    pub nodes: Vec<ProjectNode>,
    /// Nearest enclosing ecosystem root of the start directory, if any
    pub ecosystem_root: Option<PathBuf>,
}

impl Inventory {
    /// Find the node for an exact directory
    pub fn find(&self, path: &Path) -> Option<&ProjectNode> {
        self.nodes.iter().find(|node| node.path == path)
    }
}
