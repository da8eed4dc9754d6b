//! Runs the compiled `archsmith` binary against the simulated provider.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn archsmith(workdir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("archsmith"));
    cmd.current_dir(workdir.path())
        .env_remove("ARCHSMITH_HOME")
        .env_remove("ARCHSMITH_LLM_PROVIDER")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    archsmith(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("archsmith"));
}

#[test]
fn dry_run_generate_writes_document() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("brief.md"),
        "# Brief\n\nThe office has twelve meeting rooms across two floors.\n",
    )
    .unwrap();

    archsmith(&dir)
        .args([
            "--dry-run",
            "generate",
            "--requirement",
            "Staff book meeting rooms from a web page",
            "--requirement",
            "Bookings sync with Outlook | Priority: High | Category: Constraint",
            "--doc",
            "brief.md",
            "--out",
            "out/architecture.md",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote out/architecture.md"));

    let written = std::fs::read_to_string(dir.path().join("out/architecture.md")).unwrap();
    assert!(written.contains("# Solution Architecture Document"));
    assert!(written.contains("## 1. Executive Summary"));
    assert!(written.contains("```mermaid"));
}

#[test]
fn dry_run_generate_to_stdout() {
    let dir = TempDir::new().unwrap();
    archsmith(&dir)
        .args([
            "--dry-run",
            "generate",
            "-r",
            "Users reset passwords by email",
            "--out",
            "-",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Solution Architecture Document"));
}

#[test]
fn generate_without_requirements_exits_with_context_code() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "Meeting rooms on floor two.\n").unwrap();
    archsmith(&dir)
        .args(["--dry-run", "generate", "--doc", "notes.txt", "--out", "-"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No requirements recorded"));
}

#[test]
fn invalid_priority_is_rejected() {
    let dir = TempDir::new().unwrap();
    archsmith(&dir)
        .args([
            "--dry-run",
            "generate",
            "-r",
            "Users log in | Priority: someday",
        ])
        .assert()
        .code(3);
}

#[test]
fn config_shows_cli_provider_override() {
    let dir = TempDir::new().unwrap();
    archsmith(&dir)
        .args(["config", "--provider", "simulated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("llm.provider"))
        .stdout(predicate::str::contains("simulated"))
        .stdout(predicate::str::contains("[cli]"));
}

#[test]
fn config_json_is_canonical() {
    let dir = TempDir::new().unwrap();
    let output = archsmith(&dir)
        .args(["--dry-run", "config", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["llm.provider"]["value"], "simulated");
}

#[test]
fn chat_quits_cleanly() {
    let dir = TempDir::new().unwrap();
    let mut cmd = archsmith(&dir);
    cmd.args(["--dry-run", "chat"]);
    cmd.stdin(Stdio::piped());
    let mut child = cmd.stdout(Stdio::piped()).spawn().unwrap();
    {
        use std::io::Write;
        let stdin = child.stdin.as_mut().unwrap();
        stdin.write_all(b"/add Staff book rooms\n/review\n/quit\n").unwrap();
    }
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Recorded"));
    assert!(stdout.contains("Requirements (1):"));
    assert!(stdout.contains("Goodbye."));
}
