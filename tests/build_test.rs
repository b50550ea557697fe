//! Integration tests for `ecoctl build`
//!
//! Drives the binary against temporary ecosystems:
//! - batch JSON results and summary
//! - exit status on failure
//! - dry-run plans
//! - name filters
//! - scope resolution from sub-projects and worktrees

#![cfg(unix)]

mod common;

use common::{stdout_json, TestProject};
use serde_json::json;

fn result_names(report: &serde_json::Value) -> Vec<String> {
    let mut names: Vec<String> = report["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

fn result_for<'a>(report: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    report["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap_or_else(|| panic!("no result for {name}"))
}

#[test]
fn test_build_json_reports_every_project() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "echo api-ok", &[]);
    eco.add_project("web", "echo web-ok", &[]);

    let output = eco.run(".", &["--json", "build", "-j", "2"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = stdout_json(&output);
    assert_eq!(report["mode"], "build");
    assert_eq!(report["jobs"], 2);
    assert_eq!(report["summary"], json!({ "total": 2, "success": 2, "failed": 0 }));
    assert_eq!(result_names(&report), vec!["api", "web"]);

    let api = result_for(&report, "api");
    assert_eq!(api["success"], true);
    assert_eq!(api["wave"], 1);
    assert!(api["duration"].as_f64().unwrap() >= 0.0);
    assert!(api.get("output").is_none());
}

#[test]
fn test_build_failure_exits_non_zero_with_counts() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "echo api-ok", &[]);
    eco.add_project("web", "echo web-broken; exit 1", &[]);

    let output = eco.run(".", &["--json", "build"]);
    assert!(!output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["summary"], json!({ "total": 2, "success": 1, "failed": 1 }));

    let web = result_for(&report, "web");
    assert_eq!(web["success"], false);
    assert_eq!(web["error"], "exited with status 1");
    assert_eq!(web["output"], "web-broken\n");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 2 build(s) failed"), "stderr: {stderr}");
}

#[test]
fn test_build_runs_dependencies_in_earlier_waves() {
    let eco = TestProject::ecosystem();
    let marker = eco.path().join("lib-built");
    eco.add_project("lib", &format!("touch {}", marker.display()), &[]);
    eco.add_project("app", &format!("test -f {}", marker.display()), &["lib"]);

    let output = eco.run(".", &["--json", "build", "-j", "4"]);
    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );

    let report = stdout_json(&output);
    assert_eq!(result_for(&report, "lib")["wave"], 1);
    assert_eq!(result_for(&report, "app")["wave"], 2);
}

#[test]
fn test_exported_bin_dir_is_on_path_for_later_waves() {
    let eco = TestProject::ecosystem();
    eco.add_project("tool", "true", &[]);
    eco.create_file("tool/bin/acme-gen", "#!/bin/sh\necho generated\n");
    make_executable(&eco.path().join("tool/bin/acme-gen"));
    eco.add_project("app", "acme-gen", &["tool"]);

    let output = eco.run(".", &["--json", "build"]);
    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
}

#[test]
fn test_fail_fast_stops_later_waves() {
    let eco = TestProject::ecosystem();
    eco.add_project("lib", "exit 2", &[]);
    eco.add_project("app", "touch app-built", &["lib"]);

    let output = eco.run(".", &["--json", "build", "--fail-fast"]);
    assert!(!output.status.success());

    let report = stdout_json(&output);
    assert_eq!(result_names(&report), vec!["lib"]);
    assert!(!eco.file_exists("app/app-built"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lib"), "stderr: {stderr}");
}

#[test]
fn test_dry_run_prints_waves_without_building() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "touch built", &[]);
    eco.add_project("docs", "touch built", &[]);
    eco.add_project("web", "touch built", &["api"]);

    let output = eco.run(".", &["--json", "build", "--dry-run"]);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(
        report,
        json!({
            "mode": "dry-run",
            "waves": 2,
            "total": 3,
            "build_order": [["api", "docs"], ["web"]],
        })
    );
    for name in ["api", "docs", "web"] {
        assert!(!eco.file_exists(&format!("{name}/built")));
    }
}

#[test]
fn test_dry_run_without_dependencies_lists_projects() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "true", &[]);
    eco.add_project("web", "true", &["not-in-this-ecosystem"]);

    let output = eco.run(".", &["--json", "build", "--dry-run"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({ "projects": ["api", "web"] }));
}

#[test]
fn test_dry_run_text_shows_plan() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "true", &[]);
    eco.add_project("web", "true", &["api"]);

    let output = eco.run(".", &["build", "--dry-run"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 project(s) in 2 wave(s)"), "stdout: {stdout}");
    assert!(stdout.contains("Wave 2"));
    assert!(stdout.contains("(after: api)"));
}

#[test]
fn test_strict_rejects_cycles() {
    let eco = TestProject::ecosystem();
    eco.add_project("a", "true", &["b"]);
    eco.add_project("b", "true", &["a"]);

    let output = eco.run(".", &["--json", "build", "--dry-run"]);
    assert!(output.status.success(), "cycles are forced into one wave by default");

    let output = eco.run(".", &["build", "--dry-run", "--strict"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Circular dependency"), "stderr: {stderr}");
}

#[test]
fn test_filter_and_exclude() {
    let eco = TestProject::ecosystem();
    eco.add_project("app-core", "true", &[]);
    eco.add_project("app-web", "true", &[]);
    eco.add_project("docs", "true", &[]);

    let output = eco.run(".", &["--json", "build", "--filter", "app-*"]);
    assert_eq!(result_names(&stdout_json(&output)), vec!["app-core", "app-web"]);

    let output = eco.run(".", &["--json", "build", "--exclude", "docs,app-web"]);
    assert_eq!(result_names(&stdout_json(&output)), vec!["app-core"]);
}

#[test]
fn test_root_config_excludes_projects() {
    let eco = TestProject::new();
    eco.create_file(
        "eco.toml",
        "[ecosystem]\nname = \"acme\"\n\n[build]\nexclude = [\"docs\"]\n",
    );
    eco.add_project("api", "true", &[]);
    eco.add_project("docs", "exit 1", &[]);

    let output = eco.run(".", &["--json", "build"]);
    assert!(output.status.success());
    assert_eq!(result_names(&stdout_json(&output)), vec!["api"]);
}

#[test]
fn test_sub_project_builds_only_itself() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "true", &[]);
    eco.add_project("web", "true", &["api"]);

    let output = eco.run("web", &["--json", "build"]);
    assert!(output.status.success());
    assert_eq!(result_names(&stdout_json(&output)), vec!["web"]);
}

#[test]
fn test_ecosystem_worktree_builds_its_members() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "true", &[]);
    eco.create_file(".worktrees/feature/eco.toml", common::ECOSYSTEM_CONFIG);
    eco.create_file(
        ".worktrees/feature/api/eco.toml",
        "[build]\ncommand = [\"true\"]\n",
    );
    eco.create_file(
        ".worktrees/feature/cli/eco.toml",
        "[build]\ncommand = [\"true\"]\n",
    );

    let output = eco.run(".worktrees/feature/api", &["--json", "build"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = stdout_json(&output);
    assert_eq!(result_names(&report), vec!["api", "cli"]);
    for result in report["results"].as_array().unwrap() {
        assert!(result["path"].as_str().unwrap().contains(".worktrees"));
    }
}

#[test]
fn test_invalid_config_is_fatal() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "true", &[]);
    eco.create_file("web/eco.toml", "[build\ncommand = ");

    let output = eco.run(".", &["build"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("eco.toml"), "stderr: {stderr}");
}

#[test]
fn test_verbose_streams_prefixed_output() {
    let eco = TestProject::ecosystem();
    eco.add_project("api", "echo hello from api", &[]);

    let output = eco.run(".", &["build", "-v"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[api] hello from api"), "stdout: {stdout}");
}

#[test]
fn test_summary_repeats_failed_output() {
    let eco = TestProject::ecosystem();
    eco.add_project("web", "echo missing-header.h; exit 3", &[]);

    let output = eco.run(".", &["build"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("web"), "stdout: {stdout}");
    assert!(stdout.contains("missing-header.h"), "stdout: {stdout}");
}

#[test]
fn test_global_config_default_command() {
    let eco = TestProject::ecosystem();
    eco.create_dir("api/.git");
    eco.create_file(
        ".ecoctl-config/config.toml",
        "[build]\ncommand = [\"sh\", \"-c\", \"echo via-global\"]\n",
    );

    let output = eco.run(".", &["--json", "build"]);
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(result_names(&report), vec!["api"]);
}

fn make_executable(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
