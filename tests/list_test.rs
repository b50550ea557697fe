//! Integration tests for `ecoctl list`

mod common;

use common::{stdout_json, TestProject};

fn listed(output: &std::process::Output) -> Vec<(String, String)> {
    stdout_json(output)["projects"]
        .as_array()
        .expect("projects array")
        .iter()
        .map(|p| {
            (
                p["name"].as_str().unwrap().to_string(),
                p["kind"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[test]
fn test_list_from_ecosystem_root() {
    let eco = TestProject::ecosystem();
    eco.create_dir("api/.git");
    eco.create_file("web/eco.toml", "");
    eco.create_dir("notes");
    eco.create_dir("api/.worktrees/fix-login/.git");

    let output = eco.run(".", &["--json", "list"]);
    assert!(output.status.success());
    assert_eq!(
        listed(&output),
        vec![
            ("api".to_string(), "ecosystem-sub-project".to_string()),
            ("web".to_string(), "ecosystem-sub-project".to_string()),
        ]
    );
}

#[test]
fn test_list_from_sub_project_worktree() {
    let eco = TestProject::ecosystem();
    eco.create_dir("api/.git");
    eco.create_dir("api/.worktrees/fix-login/.git");

    let output = eco.run("api/.worktrees/fix-login", &["--json", "list"]);
    assert!(output.status.success());
    assert_eq!(
        listed(&output),
        vec![("fix-login".to_string(), "ecosystem-sub-project-worktree".to_string())]
    );
}

#[test]
fn test_list_standalone_project() {
    let project = TestProject::new();
    project.create_file("eco.toml", "[build]\ncommand = \"cargo build\"\n");

    let output = project.run(".", &["--json", "list"]);
    assert!(output.status.success());
    let projects = listed(&output);
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].1, "standalone-project");
}

#[test]
fn test_list_unknown_directory_falls_back() {
    let eco = TestProject::ecosystem();
    eco.create_dir("api/.git");
    eco.create_dir("scratch/tmp");

    let output = eco.run("scratch/tmp", &["list"]);
    assert!(output.status.success(), "unknown directories are not an error");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("api"), "stdout: {stdout}");
}

#[test]
fn test_list_text_table() {
    let eco = TestProject::ecosystem();
    eco.create_dir("api/.git");

    let output = eco.run(".", &["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NAME"));
    assert!(stdout.contains("sub-project"));
}
