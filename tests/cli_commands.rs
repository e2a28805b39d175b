//! CLI-level integration tests for the read-only reporting commands
//! (`rescan`, `status`). `chat`/`run`/`serve` are exercised at the unit/
//! integration level elsewhere since they need a configured model and
//! real or mock LLM traffic.

mod common;

use assert_fs::prelude::*;
use common::TestContext;
use predicates::prelude::*;
use std::fs;

#[test]
fn rescan_reports_zero_workflows_for_an_empty_data_root() {
    let ctx = TestContext::new();

    ctx.cli()
        .arg("rescan")
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded 0 workflow(s)"));
}

#[test]
fn rescan_reports_a_loaded_workflow_and_leaves_it_untouched() {
    let ctx = TestContext::new();
    let workflow_file = ctx.data_root().child("notes/Workflows/digest.md");
    let source = "---\ncron: \"0 9 * * *\"\n---\n## Step\nbody\n";
    workflow_file.write_str(source).expect("write workflow fixture");

    ctx.cli()
        .arg("rescan")
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded 1 workflow(s)"));

    workflow_file.assert(predicate::str::similar(source));
}

#[test]
fn rescan_reports_a_parse_failure_without_aborting() {
    let ctx = TestContext::new();
    let workflows_dir = ctx.data_path().join("notes/Workflows");
    fs::create_dir_all(&workflows_dir).expect("create Workflows dir");
    fs::write(workflows_dir.join("broken.md"), "no frontmatter here").expect("write broken workflow");

    ctx.cli()
        .arg("rescan")
        .assert()
        .success()
        .stdout(predicate::str::contains("failed to parse"));
}

#[test]
fn status_reports_workflow_and_job_counts_for_an_empty_data_root() {
    let ctx = TestContext::new();

    ctx.cli()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("workflows: 0 loaded, 0 failed to parse"))
        .stdout(predicate::str::contains("scheduled jobs: 0"));
}

#[test]
fn missing_roots_fail_loudly_with_a_clear_message() {
    let mut cmd = assert_cmd::Command::cargo_bin("assistantmd").expect("locate assistantmd binary");
    cmd.arg("status")
        .env_remove("CONTAINER_DATA_ROOT")
        .env_remove("CONTAINER_SYSTEM_ROOT")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONTAINER_SYSTEM_ROOT"));
}
