use std::sync::Arc;

use tempfile::TempDir;
use tgraph_lib::buildfile::{self, BuildFile, DEFAULT_BUILD_FILE};
use tgraph_lib::context::{BuildContext, props};
use tgraph_lib::execute::{ExecuteConfig, ExecuteError, Scheduler, TargetGraph};

fn scheduler_for(file: &BuildFile, root: &std::path::Path) -> (Scheduler, Arc<BuildContext>) {
  let registry = file.to_registry().unwrap();
  let context = Arc::new(BuildContext::with_defaults(root));
  file.apply_properties(&context);
  let scheduler = Scheduler::new(Arc::new(registry), context.clone(), ExecuteConfig::default());
  (scheduler, context)
}

#[cfg(unix)]
#[tokio::test]
async fn build_file_targets_run_commands_in_order() {
  let temp_dir = TempDir::new().unwrap();
  let path = temp_dir.path().join(DEFAULT_BUILD_FILE);
  std::fs::write(
    &path,
    r#"{
      "default_targets": ["pack"],
      "properties": { "version": "2.1.0" },
      "targets": [
        { "name": "prepare", "actions": [{ "type": "cmd", "cmd": "mkdir -p $${prop:output_dir}" }] },
        { "name": "stamp", "depends_on": ["prepare"], "actions": [
          { "type": "cmd", "cmd": "echo $${prop:version}-$BUILD_KIND", "env": { "BUILD_KIND": "release" }, "capture": "stamp" }
        ] },
        { "name": "pack", "depends_on": ["stamp", "prepare"], "actions": [
          { "type": "cmd", "cmd": "echo $${prop:stamp} > stamp.txt", "cwd": "$${prop:output_dir}" }
        ] }
      ]
    }"#,
  )
  .unwrap();

  let file = buildfile::load(&path).unwrap();
  let (scheduler, context) = scheduler_for(&file, temp_dir.path());

  let result = scheduler.run::<&str>(&[], false).await;

  assert!(result.succeeded, "{:?}", result.failures);
  assert_eq!(result.executed_order, vec!["prepare", "stamp", "pack"]);
  assert_eq!(context.get("stamp").as_deref(), Some("2.1.0-release"));
  let stamp = std::fs::read_to_string(temp_dir.path().join("output").join("stamp.txt")).unwrap();
  assert_eq!(stamp.trim(), "2.1.0-release");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_exit_code_is_kept() {
  let temp_dir = TempDir::new().unwrap();
  let file = BuildFile::from_json(
    r#"{ "targets": [
      { "name": "test", "actions": [{ "type": "cmd", "cmd": "exit 9" }] },
      { "name": "publish", "depends_on": ["test"], "actions": [{ "type": "cmd", "cmd": "touch published" }] }
    ] }"#,
  )
  .unwrap();
  let (scheduler, _) = scheduler_for(&file, temp_dir.path());

  let result = scheduler.run(&["publish"], false).await;

  assert!(!result.succeeded);
  assert_eq!(result.exit_code(), 9);
  assert!(!temp_dir.path().join("published").exists());
}

#[tokio::test]
async fn set_property_actions_feed_later_targets() {
  let temp_dir = TempDir::new().unwrap();
  let file = BuildFile::from_json(
    r#"{ "targets": [
      { "name": "configure", "actions": [{ "type": "set_property", "key": "artifact", "value": "$${prop:build_dir}/app.zip" }] },
      { "name": "publish", "depends_on": ["configure"],
        "actions": [{ "type": "set_property", "key": "published", "value": "$${prop:artifact}" }] }
    ] }"#,
  )
  .unwrap();
  let (scheduler, context) = scheduler_for(&file, temp_dir.path());

  let result = scheduler.run(&["publish"], false).await;

  assert!(result.succeeded, "{:?}", result.failures);
  assert_eq!(context.get("published").as_deref(), Some("build/app.zip"));
  assert_eq!(context.get(props::BUILD_DIR).as_deref(), Some("build"));
}

#[test]
fn check_reports_every_unknown_dependency() {
  let file = BuildFile::from_json(
    r#"{ "targets": [
      { "name": "a", "depends_on": ["missing"] },
      { "name": "b", "depends_on": ["a", "other"] }
    ] }"#,
  )
  .unwrap();
  let registry = file.to_registry().unwrap();

  let err = TargetGraph::from_registry(&registry).err().unwrap();

  assert_eq!(
    err,
    ExecuteError::TargetNotFound {
      names: vec!["missing".to_string(), "other".to_string()]
    }
  );
}
