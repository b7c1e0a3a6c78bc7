#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

/// A → (B, C) fan-out where every target appends its name to `log.txt`.
const SHARED_DEP_BUILD: &str = r#"{
  "targets": [
    { "name": "A", "actions": [{ "type": "cmd", "cmd": "echo A >> log.txt" }] },
    { "name": "B", "depends_on": ["A"], "actions": [{ "type": "cmd", "cmd": "echo B >> log.txt" }] },
    { "name": "C", "depends_on": ["A"], "actions": [{ "type": "cmd", "cmd": "echo C >> log.txt" }] }
  ]
}"#;

fn log_lines(env: &TestEnv) -> Vec<String> {
  env.read_file("log.txt").lines().map(str::to_string).collect()
}

#[test]
fn run_sequential_executes_shared_dependency_once() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  env
    .cmd()
    .args(["run", "B", "C"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Build succeeded"));

  assert_eq!(log_lines(&env), vec!["A", "B", "C"]);
}

#[test]
fn run_parallel_executes_shared_dependency_once() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  env.cmd().args(["run", "--parallel", "B", "C"]).assert().success();

  let lines = log_lines(&env);
  assert_eq!(lines.len(), 3);
  assert_eq!(lines[0], "A");
  assert_eq!(lines.iter().filter(|l| *l == "A").count(), 1);
}

#[test]
fn run_prints_build_summary() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  env
    .cmd()
    .args(["run", "B"])
    .assert()
    .success()
    .stdout(
      predicate::str::contains("Build summary")
        .and(predicate::str::contains("A"))
        .and(predicate::str::contains("Build time")),
    );
}

#[test]
fn run_unknown_target_exits_with_code_3() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  env
    .cmd()
    .args(["run", "nope"])
    .assert()
    .code(3)
    .stderr(predicate::str::contains("target nope not found"));

  assert!(!env.path("log.txt").exists());
}

#[test]
fn run_warn_unknown_runs_remaining_targets() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  env
    .cmd()
    .args(["run", "--warn-unknown", "nope", "B"])
    .assert()
    .success()
    .stderr(predicate::str::contains("nope"));

  assert_eq!(log_lines(&env), vec!["A", "B"]);
}

#[test]
fn run_cycle_fails_without_running_actions() {
  let env = TestEnv::with_build_file(
    r#"{ "targets": [
      { "name": "A", "depends_on": ["C"], "actions": [{ "type": "cmd", "cmd": "echo A >> log.txt" }] },
      { "name": "B", "depends_on": ["A"], "actions": [{ "type": "cmd", "cmd": "echo B >> log.txt" }] },
      { "name": "C", "depends_on": ["B"], "actions": [{ "type": "cmd", "cmd": "echo C >> log.txt" }] }
    ] }"#,
  );

  env
    .cmd()
    .args(["run", "A"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("cyclic dependency"));

  assert!(!env.path("log.txt").exists());
}

#[test]
fn run_failing_command_forwards_exit_code() {
  let env = TestEnv::with_build_file(
    r#"{ "targets": [
      { "name": "A", "actions": [{ "type": "cmd", "cmd": "exit 4" }] },
      { "name": "B", "depends_on": ["A"], "actions": [{ "type": "cmd", "cmd": "echo B >> log.txt" }] }
    ] }"#,
  );

  env
    .cmd()
    .args(["run", "B"])
    .assert()
    .code(4)
    .stderr(predicate::str::contains("Build failed"));

  assert!(!env.path("log.txt").exists());
}

#[test]
fn run_without_targets_uses_default_targets() {
  let env = TestEnv::with_build_file(
    r#"{
      "default_targets": ["C"],
      "targets": [
        { "name": "A", "actions": [{ "type": "cmd", "cmd": "echo A >> log.txt" }] },
        { "name": "C", "depends_on": ["A"], "actions": [{ "type": "cmd", "cmd": "echo C >> log.txt" }] }
      ]
    }"#,
  );

  env.cmd().arg("run").assert().success();

  assert_eq!(log_lines(&env), vec!["A", "C"]);
}

#[test]
fn run_uses_build_file_properties() {
  let env = TestEnv::with_build_file(
    r#"{
      "properties": { "version": "3.0.1" },
      "targets": [
        { "name": "version", "actions": [{ "type": "cmd", "cmd": "echo $${prop:version}", "capture": "stamp" }] },
        { "name": "write", "depends_on": ["version"],
          "actions": [{ "type": "cmd", "cmd": "echo $${prop:stamp} > version.txt" }] }
      ]
    }"#,
  );

  env.cmd().args(["run", "write"]).assert().success();

  assert_eq!(env.read_file("version.txt").trim(), "3.0.1");
}

#[test]
fn run_json_output_reports_execution() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  let output = env.cmd().args(["run", "B", "C", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["succeeded"], true);
  assert_eq!(json["executed"], serde_json::json!(["A", "B", "C"]));
  assert_eq!(json["dependency_executions"], 1);
  assert_eq!(json["summary"]["entries"].as_array().unwrap().len(), 3);
}

#[test]
fn run_with_jobs_limit() {
  let env = TestEnv::with_build_file(SHARED_DEP_BUILD);

  env.cmd().args(["run", "-p", "-j", "1", "B", "C"]).assert().success();

  assert_eq!(log_lines(&env).len(), 3);
}
