//! Build scope resolution
//!
//! Decides which discovered projects a command applies to, based on where in
//! the ecosystem hierarchy the working directory sits. An unclassifiable
//! directory is never an error: it falls back to the whole inventory.

use std::path::{Path, PathBuf};

use crate::core::project::{Inventory, ProjectKind, ProjectNode};

/// Projects in scope for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Buildable projects, in discovery order
    pub targets: Vec<ProjectNode>,
    /// Directory the scope is anchored at
    pub root: PathBuf,
    /// Whether the working directory could not be classified
    pub fallback: bool,
}

/// Resolve the scope for `cwd` (absolute) against `inventory`
pub fn resolve_scope(cwd: &Path, inventory: &Inventory) -> Scope {
    let Some(node) = inventory.find(cwd) else {
        return fallback_scope(cwd, inventory);
    };

    tracing::debug!("Working directory is a {} at {}", node.kind, node.path.display());

    match node.kind {
        ProjectKind::EcosystemWorktree => worktree_scope(&node.path, inventory),
        ProjectKind::EcosystemWorktreeSubProject
        | ProjectKind::EcosystemWorktreeSubProjectWorktree => match &node.parent_scope {
            Some(tree) => worktree_scope(tree, inventory),
            None => fallback_scope(cwd, inventory),
        },
        ProjectKind::EcosystemRoot => Scope {
            targets: inventory
                .nodes
                .iter()
                .filter(|n| n.kind == ProjectKind::EcosystemSubProject && n.belongs_to(&node.path))
                .cloned()
                .collect(),
            root: node.path.clone(),
            fallback: false,
        },
        ProjectKind::EcosystemSubProject
        | ProjectKind::EcosystemSubProjectWorktree
        | ProjectKind::StandaloneProject
        | ProjectKind::StandaloneProjectWorktree => Scope {
            targets: vec![node.clone()],
            root: node.path.clone(),
            fallback: false,
        },
    }
}

/// Members of an ecosystem worktree (the worktree root itself is a meta-project)
fn worktree_scope(tree: &Path, inventory: &Inventory) -> Scope {
    Scope {
        targets: inventory
            .nodes
            .iter()
            .filter(|n| n.kind.is_worktree_member() && n.belongs_to(tree))
            .cloned()
            .collect(),
        root: tree.to_path_buf(),
        fallback: false,
    }
}

/// Everything discovered, minus meta-projects
fn fallback_scope(cwd: &Path, inventory: &Inventory) -> Scope {
    let root = inventory
        .ecosystem_root
        .clone()
        .unwrap_or_else(|| cwd.to_path_buf());

    tracing::warn!(
        "{} is not a known project; using every project discovered under {}",
        cwd.display(),
        root.display()
    );

    Scope {
        targets: inventory
            .nodes
            .iter()
            .filter(|n| !n.kind.is_meta())
            .cloned()
            .collect(),
        root,
        fallback: true,
    }
}
