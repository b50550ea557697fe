//! List command implementation
//!
//! Implements `ecoctl list` to show which projects the current directory
//! applies to.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{status, OutputConfig};
use crate::core::project::{ProjectKind, ProjectNode};

#[derive(Serialize)]
struct ListReport<'a> {
    root: &'a Path,
    projects: Vec<ProjectEntry<'a>>,
}

#[derive(Serialize)]
struct ProjectEntry<'a> {
    name: String,
    kind: ProjectKind,
    path: &'a Path,
}

/// Execute the list command
pub fn execute(cwd: &Path, output: &OutputConfig) -> Result<()> {
    let scope = super::resolve_cwd_scope(cwd)?;

    if output.json {
        let report = ListReport {
            root: &scope.root,
            projects: scope.targets.iter().map(entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    if scope.fallback {
        println!(
            "{} {} is not a known project; showing every discovered project",
            status::WARNING,
            cwd.display()
        );
    }
    if scope.targets.is_empty() {
        println!("{} No projects in scope", status::INFO);
        return Ok(());
    }

    println!("{:<24} {:<30} PATH", "NAME", "KIND");
    for node in &scope.targets {
        println!(
            "{:<24} {:<30} {}",
            node.name(),
            node.kind.to_string(),
            node.path.display()
        );
    }
    Ok(())
}

fn entry(node: &ProjectNode) -> ProjectEntry<'_> {
    ProjectEntry {
        name: node.name(),
        kind: node.kind,
        path: &node.path,
    }
}
