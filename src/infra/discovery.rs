//! Project discovery
//!
//! Walks the filesystem around the working directory and classifies every
//! project it finds into a [`ProjectKind`]. Layout:
//!
//! - a project is a directory with an `eco.toml` or a `.git` entry
//! - an ecosystem root is a project whose `eco.toml` has an `[ecosystem]` table
//! - sub-projects are the non-hidden child projects of a root (or of a root's worktree)
//! - worktrees of a project `P` live in `P/.worktrees/<name>`

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::defaults;
use crate::core::project::{Inventory, ProjectKind, ProjectNode};
use crate::core::project_config::ProjectConfig;
use crate::error::DiscoveryError;

/// Discover the inventory relevant to `start`
///
/// Discovery is rooted at the nearest enclosing ecosystem root, else the
/// nearest enclosing project, else `start` itself.
///
/// # Errors
///
/// Returns an error if `start` is not a directory, a directory cannot be
/// listed, or a project's `eco.toml` is invalid.
pub fn discover(start: &Path) -> Result<Inventory, DiscoveryError> {
    if !start.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: start.to_path_buf(),
        });
    }

    if let Some(root) = find_ecosystem_root(start)? {
        tracing::debug!("Discovering ecosystem at {}", root.display());
        let nodes = discover_ecosystem(&root)?;
        return Ok(Inventory {
            nodes,
            ecosystem_root: Some(root),
        });
    }

    let root = find_project_root(start).unwrap_or_else(|| start.to_path_buf());
    tracing::debug!("Discovering standalone projects at {}", root.display());
    Ok(Inventory {
        nodes: discover_standalone(&root)?,
        ecosystem_root: None,
    })
}

/// Whether `dir` looks like a project
pub fn is_project(dir: &Path) -> bool {
    ProjectConfig::path_in(dir).is_file() || dir.join(defaults::GIT_DIR).exists()
}

fn is_ecosystem(dir: &Path) -> Result<bool, DiscoveryError> {
    if !ProjectConfig::path_in(dir).is_file() {
        return Ok(false);
    }
    Ok(ProjectConfig::load(dir)?.is_ecosystem())
}

/// If `dir` is `<owner>/.worktrees/<name>`, return `<owner>`
fn worktree_owner(dir: &Path) -> Option<&Path> {
    let parent = dir.parent()?;
    if parent.file_name()? == defaults::WORKTREES_DIR {
        parent.parent()
    } else {
        None
    }
}

/// Nearest ancestor that is an ecosystem root, seen through worktrees
///
/// An ecosystem worktree carries the same `[ecosystem]` table as its root,
/// so a match inside `<root>/.worktrees/` is reported as `<root>`.
fn find_ecosystem_root(start: &Path) -> Result<Option<PathBuf>, DiscoveryError> {
    for dir in start.ancestors() {
        if is_ecosystem(dir)? {
            if let Some(owner) = worktree_owner(dir) {
                if is_ecosystem(owner)? {
                    return Ok(Some(owner.to_path_buf()));
                }
            }
            return Ok(Some(dir.to_path_buf()));
        }
    }
    Ok(None)
}

fn find_project_root(start: &Path) -> Option<PathBuf> {
    let dir = start.ancestors().find(|dir| is_project(dir))?;
    match worktree_owner(dir) {
        Some(owner) if is_project(owner) => Some(owner.to_path_buf()),
        _ => Some(dir.to_path_buf()),
    }
}

/// Non-hidden child directories, sorted by name
fn child_dirs(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| DiscoveryError::Io {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            error: e.to_string(),
        })?;
        if entry.file_type().is_dir() && !entry.file_name().to_string_lossy().starts_with('.') {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// Worktrees of `project`
fn worktrees(project: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let dir = project.join(defaults::WORKTREES_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    child_dirs(&dir)
}

fn discover_ecosystem(root: &Path) -> Result<Vec<ProjectNode>, DiscoveryError> {
    let root_scope = Some(root.to_path_buf());
    let mut nodes = vec![ProjectNode::new(root, None, ProjectKind::EcosystemRoot)];

    for child in child_dirs(root)?.into_iter().filter(|d| is_project(d)) {
        let child_worktrees = worktrees(&child)?;
        nodes.push(ProjectNode::new(
            child,
            root_scope.clone(),
            ProjectKind::EcosystemSubProject,
        ));
        nodes.extend(child_worktrees.into_iter().map(|wt| {
            ProjectNode::new(wt, root_scope.clone(), ProjectKind::EcosystemSubProjectWorktree)
        }));
    }

    for tree in worktrees(root)? {
        let tree_scope = Some(tree.clone());
        let members = child_dirs(&tree)?;
        nodes.push(ProjectNode::new(
            tree.clone(),
            root_scope.clone(),
            ProjectKind::EcosystemWorktree,
        ));

        for member in members.into_iter().filter(|d| is_project(d)) {
            let member_worktrees = worktrees(&member)?;
            nodes.push(ProjectNode::new(
                member,
                tree_scope.clone(),
                ProjectKind::EcosystemWorktreeSubProject,
            ));
            nodes.extend(member_worktrees.into_iter().map(|wt| {
                ProjectNode::new(
                    wt,
                    tree_scope.clone(),
                    ProjectKind::EcosystemWorktreeSubProjectWorktree,
                )
            }));
        }
    }

    Ok(nodes)
}

fn discover_standalone(root: &Path) -> Result<Vec<ProjectNode>, DiscoveryError> {
    if !is_project(root) {
        return Ok(Vec::new());
    }

    let mut nodes = vec![ProjectNode::new(root, None, ProjectKind::StandaloneProject)];
    nodes.extend(worktrees(root)?.into_iter().map(|wt| {
        ProjectNode::new(
            wt,
            Some(root.to_path_buf()),
            ProjectKind::StandaloneProjectWorktree,
        )
    }));
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ECOSYSTEM: &str = "[ecosystem]\nname = \"acme\"\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn kinds(inventory: &Inventory, root: &Path) -> Vec<(String, ProjectKind)> {
        inventory
            .nodes
            .iter()
            .map(|n| {
                let rel = n.path.strip_prefix(root).unwrap().display().to_string();
                (rel, n.kind)
            })
            .collect()
    }

    fn ecosystem() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "eco.toml", ECOSYSTEM);
        write(&root, "api/eco.toml", "");
        write(&root, "web/eco.toml", "[build]\nafter = [\"api\"]\n");
        write(&root, "notes/readme.md", "not a project");
        write(&root, "api/.worktrees/fix/eco.toml", "");
        write(&root, ".worktrees/feature/eco.toml", ECOSYSTEM);
        write(&root, ".worktrees/feature/api/eco.toml", "");
        write(&root, ".worktrees/feature/api/.worktrees/spike/eco.toml", "");
        (dir, root)
    }

    #[test]
    fn test_ecosystem_classification() {
        let (_dir, root) = ecosystem();
        let inventory = discover(&root).unwrap();

        assert_eq!(inventory.ecosystem_root.as_deref(), Some(root.as_path()));
        assert_eq!(
            kinds(&inventory, &root),
            vec![
                (String::new(), ProjectKind::EcosystemRoot),
                ("api".into(), ProjectKind::EcosystemSubProject),
                ("api/.worktrees/fix".into(), ProjectKind::EcosystemSubProjectWorktree),
                ("web".into(), ProjectKind::EcosystemSubProject),
                (".worktrees/feature".into(), ProjectKind::EcosystemWorktree),
                (".worktrees/feature/api".into(), ProjectKind::EcosystemWorktreeSubProject),
                (
                    ".worktrees/feature/api/.worktrees/spike".into(),
                    ProjectKind::EcosystemWorktreeSubProjectWorktree
                ),
            ]
        );
    }

    #[test]
    fn test_parent_scopes() {
        let (_dir, root) = ecosystem();
        let inventory = discover(&root).unwrap();
        let feature = root.join(".worktrees/feature");

        let spike = inventory
            .find(&feature.join("api/.worktrees/spike"))
            .unwrap();
        assert_eq!(spike.parent_scope.as_deref(), Some(feature.as_path()));

        let fix = inventory.find(&root.join("api/.worktrees/fix")).unwrap();
        assert_eq!(fix.parent_scope.as_deref(), Some(root.as_path()));
    }

    #[test]
    fn test_discovery_from_inside_worktree_finds_real_root() {
        let (_dir, root) = ecosystem();
        let inventory = discover(&root.join(".worktrees/feature/api")).unwrap();
        assert_eq!(inventory.ecosystem_root.as_deref(), Some(root.as_path()));
    }

    #[test]
    fn test_standalone_project_with_worktree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        write(&root, ".worktrees/hotfix/.git", "gitdir: ../../.git/worktrees/hotfix");
        fs::create_dir_all(root.join("src")).unwrap();

        let inventory = discover(&root.join("src")).unwrap();
        assert!(inventory.ecosystem_root.is_none());
        assert_eq!(
            kinds(&inventory, &root),
            vec![
                (String::new(), ProjectKind::StandaloneProject),
                (".worktrees/hotfix".into(), ProjectKind::StandaloneProjectWorktree),
            ]
        );
    }

    #[test]
    fn test_plain_directory_has_no_projects() {
        let dir = TempDir::new().unwrap();
        let inventory = discover(dir.path()).unwrap();
        assert!(inventory.nodes.is_empty());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "eco.toml", "[ecosystem\n");
        assert!(matches!(
            discover(dir.path()),
            Err(DiscoveryError::Config(_))
        ));
    }

    #[test]
    fn test_missing_start_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover(&dir.path().join("missing")),
            Err(DiscoveryError::NotADirectory { .. })
        ));
    }
}
